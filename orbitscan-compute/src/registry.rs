use crate::computers::{BigMandelbrotPlugin, JuliaPlugin, MandelbrotPlugin};
use crate::plugin::OrbitPlugin;
use orbitscan_core::{needs_arbitrary_precision, Complex, EngineConfig};

pub struct PluginEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    pub create: fn() -> Box<dyn OrbitPlugin>,
}

pub static PLUGINS: &[PluginEntry] = &[
    PluginEntry {
        id: "mandelbrot",
        display_name: "Mandelbrot Set",
        create: || Box::new(MandelbrotPlugin::new()),
    },
    PluginEntry {
        id: "julia",
        display_name: "Julia Set",
        create: || Box::new(JuliaPlugin::new(Complex::new(-0.8, 0.156))),
    },
    PluginEntry {
        id: "big_mandelbrot",
        display_name: "Mandelbrot Set (arbitrary precision)",
        create: || Box::new(BigMandelbrotPlugin::new()),
    },
];

pub fn get_plugin_entry(id: &str) -> Option<&'static PluginEntry> {
    PLUGINS.iter().find(|p| p.id == id)
}

pub fn create_plugin(id: &str) -> Option<Box<dyn OrbitPlugin>> {
    get_plugin_entry(id).map(|entry| (entry.create)())
}

/// Create the plugin for `id`, swapping in the arbitrary-precision variant
/// when f64 cannot resolve the configured view.
pub fn select_plugin(id: &str, config: &EngineConfig) -> Option<Box<dyn OrbitPlugin>> {
    let deep = needs_arbitrary_precision(
        &config.rect,
        config.width,
        config.height,
        config.max_iterations,
    );
    if deep && id == "mandelbrot" {
        log::debug!("view needs arbitrary precision, using big_mandelbrot");
        return create_plugin("big_mandelbrot");
    }
    create_plugin(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitscan_core::{get_fractal_config, ComplexRect};

    #[test]
    fn every_plugin_has_a_fractal_config() {
        for entry in PLUGINS {
            let plugin = (entry.create)();
            assert_eq!(plugin.id(), entry.id);
            assert!(get_fractal_config(entry.id).is_some(), "{}", entry.id);
        }
    }

    #[test]
    fn unknown_plugin_is_none() {
        assert!(create_plugin("nope").is_none());
    }

    #[test]
    fn shallow_view_keeps_f64_plugin() {
        let config = EngineConfig::default();
        let plugin = select_plugin("mandelbrot", &config).map(|p| p.id().to_string());
        assert_eq!(plugin.as_deref(), Some("mandelbrot"));
    }

    #[test]
    fn deep_view_selects_big_plugin() {
        // Pixel steps far below the f64 resolution of the coordinates.
        let config =
            EngineConfig::default().with_rect(ComplexRect::new(1e12, 1e12 + 1e-3, 0.0, 1e-3));
        let plugin = select_plugin("mandelbrot", &config).map(|p| p.id().to_string());
        assert_eq!(plugin.as_deref(), Some("big_mandelbrot"));
    }
}
