pub mod bigfloat;
pub mod complex;
pub mod config;
pub mod coords;
pub mod error;
pub mod outcome;
pub mod precision;
pub mod progress;
pub mod resume;
pub mod work_item;

pub use bigfloat::BigFloat;
pub use complex::Complex;
pub use config::{
    get_fractal_config, CalcMode, EngineConfig, FiniteAttractor, FractalConfig, InsideColoring,
    OutsideColoring, SymmetryKind, BIG_MANDELBROT_CONFIG, JULIA_CONFIG, MANDELBROT_CONFIG,
    MAX_CANVAS_DIM,
};
pub use coords::{ComplexRect, CoordinateMap, Inversion};
pub use error::EngineError;
pub use outcome::{PixelOutcome, RenderStats, RunOutcome};
pub use precision::{calculate_precision_bits, needs_arbitrary_precision, required_mantissa_bits};
pub use progress::{AlgorithmState, ComputedPixel, ItemProgress, OrbitCarry};
pub use resume::{ResumeBlob, RunPhase, MAX_WORK_ITEMS, RESUME_VERSION};
pub use work_item::{SymmetryState, WorkItem};
