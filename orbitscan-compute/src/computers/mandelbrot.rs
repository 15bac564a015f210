use crate::plugin::OrbitPlugin;
use orbitscan_core::{Complex, FractalConfig, SymmetryKind, MANDELBROT_CONFIG};

/// Mandelbrot set with f64 arithmetic: `z = z² + c`, seeded at `c + param`.
#[derive(Clone, Debug)]
pub struct MandelbrotPlugin {
    config: &'static FractalConfig,
    param: Complex,
    c: Complex,
}

impl Default for MandelbrotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl MandelbrotPlugin {
    pub fn new() -> Self {
        Self {
            config: &MANDELBROT_CONFIG,
            param: Complex::ZERO,
            c: Complex::ZERO,
        }
    }

    /// Perturb the initial orbit value. Any non-zero value breaks the
    /// x-axis symmetry.
    pub fn with_param(mut self, param: Complex) -> Self {
        self.param = param;
        self
    }
}

impl OrbitPlugin for MandelbrotPlugin {
    fn id(&self) -> &str {
        self.config.id
    }

    fn symmetry(&self) -> SymmetryKind {
        self.config.symmetry
    }

    fn bailout(&self) -> f64 {
        self.config.bailout
    }

    fn parameters(&self) -> Complex {
        self.param
    }

    fn no_guess(&self) -> bool {
        self.config.no_guess
    }

    fn no_trace(&self) -> bool {
        self.config.no_trace
    }

    fn per_pixel(&mut self, _col: i32, _row: i32, point: Complex) -> Complex {
        self.c = point;
        point + self.param
    }

    #[inline]
    fn orbit_step(&mut self, z: &mut Complex) -> bool {
        *z = z.square() + self.c;
        z.norm_sq() >= self.config.bailout
    }
}
