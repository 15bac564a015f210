//! Engine and fractal configuration.
//!
//! `EngineConfig` describes one render: canvas, view, coherence algorithm
//! and coloring options. `FractalConfig` is the static per-fractal registry
//! used by the built-in orbit plugins.

use crate::{ComplexRect, EngineError, Inversion};
use serde::{Deserialize, Serialize};

/// Largest accepted canvas dimension. Resume cursors pack coordinates
/// into 16 bits.
pub const MAX_CANVAS_DIM: u32 = 32767;

/// Coherence algorithm used to fill the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMode {
    OnePass,
    TwoPass,
    /// Coarse solid-guess preview, then a full one- or two-pass render.
    ThreePass,
    SolidGuess,
    BoundaryTrace,
    Tesseral,
    Diffusion,
}

/// Color for points that never escape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsideColoring {
    Color(u32),
    MaxIter,
    /// Detected cycle length.
    Period,
    ZMag,
    Atan,
}

/// Color for escaping points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutsideColoring {
    Iteration,
    Color(u32),
    Real,
    Imag,
    Mult,
    Sum,
    Atan,
}

impl OutsideColoring {
    /// Modes whose color depends on the final orbit value, not only on the
    /// iteration count. These break mirror symmetry.
    pub fn uses_final_orbit(self) -> bool {
        matches!(
            self,
            OutsideColoring::Real
                | OutsideColoring::Imag
                | OutsideColoring::Mult
                | OutsideColoring::Sum
                | OutsideColoring::Atan
        )
    }
}

/// Finite attractor detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiniteAttractor {
    #[default]
    Off,
    On,
    /// Color attracted points by iteration phase within the attractor period.
    Phase,
}

/// Mirror symmetry a fractal family guarantees.
///
/// The `NoParam`/`NoReal`/`NoImag` variants only hold when the fractal's
/// parameter (or its real/imaginary part) is exactly zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymmetryKind {
    None,
    XAxis,
    XAxisNoParam,
    XAxisNoReal,
    XAxisNoImag,
    YAxis,
    YAxisNoParam,
    XYAxis,
    XYAxisNoParam,
    Origin,
    OriginNoParam,
    PiSym,
    PiSymNoParam,
}

/// Options for one render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    pub rect: ComplexRect,
    pub calc_mode: CalcMode,
    pub max_iterations: u32,
    /// Palette size.
    pub colors: u32,
    pub inside: InsideColoring,
    pub outside: OutsideColoring,
    /// 0 disables cycle detection. The magnitude sets the closeness
    /// threshold; negative values paint caught cycles with color 7.
    pub periodicity_check: i32,
    /// Last solid-guess pass to run (0 runs all passes).
    pub stop_pass: u32,
    /// Overrides the color of inferred fills. `Some(0)` means "plot samples only".
    pub fill_color: Option<u32>,
    pub finite_attractor: FiniteAttractor,
    pub inversion: Option<Inversion>,
    /// Iterations accumulated between abort polls.
    pub poll_interval: u32,
    /// Decomposition coloring is active in the color layer.
    pub decomposition: bool,
    /// 16-bit continuous potential is active in the color layer.
    pub potential_16bit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            rect: ComplexRect::default(),
            calc_mode: CalcMode::SolidGuess,
            max_iterations: 150,
            colors: 256,
            inside: InsideColoring::Color(1),
            outside: OutsideColoring::Iteration,
            periodicity_check: 1,
            stop_pass: 0,
            fill_color: None,
            finite_attractor: FiniteAttractor::Off,
            inversion: None,
            poll_interval: 800,
            decomposition: false,
            potential_16bit: false,
        }
    }
}

impl EngineConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_rect(mut self, rect: ComplexRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_mode(mut self, calc_mode: CalcMode) -> Self {
        self.calc_mode = calc_mode;
        self
    }

    /// Check everything that can be checked without a plugin.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_CANVAS_DIM
            || self.height > MAX_CANVAS_DIM
        {
            return Err(EngineError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations == 0 {
            return Err(EngineError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.colors < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "palette needs at least 2 colors, got {}",
                self.colors
            )));
        }
        if self.poll_interval == 0 {
            return Err(EngineError::InvalidConfig(
                "poll_interval must be at least 1".to_string(),
            ));
        }
        let finite = [
            self.rect.x_min,
            self.rect.x_max,
            self.rect.y_min,
            self.rect.y_max,
            self.rect.x_3rd,
            self.rect.y_3rd,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidConfig(
                "view rectangle must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a fractal type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalConfig {
    /// Unique identifier (matches plugin ID in the compute layer)
    pub id: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Default view
    pub default_rect: ComplexRect,
    pub symmetry: SymmetryKind,
    /// Escape threshold on |z|².
    pub bailout: f64,
    /// Solid guessing gives wrong results for this family.
    pub no_guess: bool,
    /// Boundary tracing gives wrong results for this family.
    pub no_trace: bool,
}

/// Mandelbrot set configuration.
pub static MANDELBROT_CONFIG: FractalConfig = FractalConfig {
    id: "mandelbrot",
    display_name: "Mandelbrot Set",
    default_rect: ComplexRect::new(-2.5, 1.5, -1.5, 1.5),
    symmetry: SymmetryKind::XAxisNoParam,
    bailout: 4.0,
    no_guess: false,
    no_trace: false,
};

/// Julia set configuration.
pub static JULIA_CONFIG: FractalConfig = FractalConfig {
    id: "julia",
    display_name: "Julia Set",
    default_rect: ComplexRect::new(-2.0, 2.0, -1.5, 1.5),
    symmetry: SymmetryKind::Origin,
    bailout: 4.0,
    no_guess: false,
    no_trace: false,
};

/// Mandelbrot set iterated with arbitrary-precision arithmetic.
pub static BIG_MANDELBROT_CONFIG: FractalConfig = FractalConfig {
    id: "big_mandelbrot",
    display_name: "Mandelbrot Set (arbitrary precision)",
    default_rect: ComplexRect::new(-2.5, 1.5, -1.5, 1.5),
    symmetry: SymmetryKind::XAxisNoParam,
    bailout: 4.0,
    no_guess: false,
    no_trace: false,
};

/// Look up a fractal configuration by ID.
pub fn get_fractal_config(id: &str) -> Option<&'static FractalConfig> {
    match id {
        "mandelbrot" => Some(&MANDELBROT_CONFIG),
        "julia" => Some(&JULIA_CONFIG),
        "big_mandelbrot" => Some(&BIG_MANDELBROT_CONFIG),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_fractal_config_finds_mandelbrot() {
        let config = get_fractal_config("mandelbrot");
        assert!(config.is_some());
        assert_eq!(config.unwrap().display_name, "Mandelbrot Set");
    }

    #[test]
    fn get_fractal_config_returns_none_for_unknown() {
        assert!(get_fractal_config("unknown_fractal").is_none());
    }

    #[test]
    fn julia_is_origin_symmetric() {
        assert_eq!(JULIA_CONFIG.symmetry, SymmetryKind::Origin);
    }

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sized_canvas_rejected() {
        let config = EngineConfig::default().with_size(0, 10);
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidCanvas {
                width: 0,
                height: 10
            })
        ));
    }

    #[test]
    fn oversized_canvas_rejected() {
        let config = EngineConfig::default().with_size(MAX_CANVAS_DIM + 1, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn single_color_palette_rejected() {
        let config = EngineConfig {
            colors: 1,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn outside_modes_using_final_orbit() {
        assert!(OutsideColoring::Real.uses_final_orbit());
        assert!(OutsideColoring::Atan.uses_final_orbit());
        assert!(!OutsideColoring::Iteration.uses_final_orbit());
        assert!(!OutsideColoring::Color(3).uses_final_orbit());
    }

    #[test]
    fn engine_config_serialization_roundtrip() {
        let original = EngineConfig {
            calc_mode: CalcMode::Tesseral,
            inside: InsideColoring::Period,
            outside: OutsideColoring::Color(12),
            fill_color: Some(5),
            finite_attractor: FiniteAttractor::Phase,
            inversion: Some(Inversion::new(1.0, crate::Complex::new(0.0, 0.0))),
            ..EngineConfig::default()
        };

        let json = serde_json::to_string(&original).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"width": 100, "height": 50, "calc_mode": "diffusion"}"#)
                .unwrap();
        assert_eq!(config.width, 100);
        assert_eq!(config.calc_mode, CalcMode::Diffusion);
        assert_eq!(config.max_iterations, 150);
    }
}
