//! Orbit plugin contract.
//!
//! A plugin supplies the fractal-specific math: one-time setup per image,
//! seeding an orbit from a pixel, and advancing that orbit by one step.
//! Everything else (scheduling, coherence, coloring) belongs to the engine.

use dyn_clone::DynClone;
use orbitscan_core::{Complex, CoordinateMap, EngineError, SymmetryKind};

/// Default capture radius (squared distance) for finite attractors.
pub const DEFAULT_ATTRACTOR_RADIUS: f64 = 1.0 / 32768.0;

/// A finite attractor an orbit may settle onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    pub point: Complex,
    /// Cycle length, used by phase coloring.
    pub period: u64,
    /// Capture radius, compared against squared distances.
    pub radius: f64,
}

impl Attractor {
    pub fn new(point: Complex, period: u64) -> Self {
        Self {
            point,
            period,
            radius: DEFAULT_ATTRACTOR_RADIUS,
        }
    }

    /// True when `z` is inside the capture radius on both axes and overall.
    #[inline]
    pub fn captures(&self, z: Complex) -> bool {
        let dx = z.re - self.point.re;
        let dx2 = dx * dx;
        if dx2 >= self.radius {
            return false;
        }
        let dy = z.im - self.point.im;
        let dy2 = dy * dy;
        dy2 < self.radius && dx2 + dy2 < self.radius
    }
}

/// What a plugin learns about the image before any pixel is computed.
#[derive(Clone, Copy, Debug)]
pub struct ImageSetup<'a> {
    pub map: &'a CoordinateMap,
    pub max_iterations: u32,
    /// Finite attractor coloring is on, so `attractors` will be consulted.
    pub find_attractors: bool,
}

/// Fractal-specific orbit functions.
///
/// Implementations must be deterministic: the same pixel always produces
/// the same orbit, otherwise coherence algorithms and resumed runs would
/// disagree with a plain scan.
pub trait OrbitPlugin: DynClone {
    /// Registry identifier.
    fn id(&self) -> &str;

    /// Geometric symmetry of the fractal at canonical parameters.
    fn symmetry(&self) -> SymmetryKind {
        SymmetryKind::None
    }

    /// Squared escape radius.
    fn bailout(&self) -> f64;

    /// Fractal parameters, consulted by parameter-gated symmetries.
    fn parameters(&self) -> Complex {
        Complex::ZERO
    }

    /// An explicit initial orbit value is in effect, which breaks the
    /// parameter-gated symmetries.
    fn uses_initial_orbit(&self) -> bool {
        false
    }

    /// Solid guessing produces wrong images for this fractal.
    fn no_guess(&self) -> bool {
        false
    }

    /// Boundary tracing produces wrong images for this fractal.
    fn no_trace(&self) -> bool {
        false
    }

    /// Finite attractors found during `per_image`.
    fn attractors(&self) -> &[Attractor] {
        &[]
    }

    /// One-time setup before the first pixel of a work item.
    fn per_image(&mut self, _setup: &ImageSetup<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    /// Seed the orbit for pixel `(col, row)` whose (inverted) point is `point`.
    fn per_pixel(&mut self, col: i32, row: i32, point: Complex) -> Complex;

    /// Advance `z` by one iteration. Returns true when the orbit escaped.
    fn orbit_step(&mut self, z: &mut Complex) -> bool;
}

dyn_clone::clone_trait_object!(OrbitPlugin);
