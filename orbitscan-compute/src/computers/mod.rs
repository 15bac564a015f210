pub mod big_mandelbrot;
pub mod julia;
pub mod mandelbrot;
pub mod test_patterns;

pub use big_mandelbrot::BigMandelbrotPlugin;
pub use julia::JuliaPlugin;
pub use mandelbrot::MandelbrotPlugin;
pub use test_patterns::{ConstantEscape, FieldOrbit, PeriodicOrbit};
