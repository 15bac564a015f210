use crate::plugin::{Attractor, ImageSetup, OrbitPlugin, DEFAULT_ATTRACTOR_RADIUS};
use orbitscan_core::{Complex, EngineError, FractalConfig, SymmetryKind, JULIA_CONFIG};

/// Longest attracting cycle searched for during setup.
const MAX_ATTRACTOR_PERIOD: u64 = 1000;

/// Julia set for `z = z² + k`.
#[derive(Clone, Debug)]
pub struct JuliaPlugin {
    config: &'static FractalConfig,
    k: Complex,
    attractors: Vec<Attractor>,
}

impl JuliaPlugin {
    pub fn new(k: Complex) -> Self {
        Self {
            config: &JULIA_CONFIG,
            k,
            attractors: Vec::new(),
        }
    }

    fn step(&self, z: Complex) -> Complex {
        z.square() + self.k
    }

    /// Follow the critical orbit. If it stays bounded, whatever cycle it
    /// settled onto is the attractor.
    fn find_attractor(&self, max_iterations: u32) -> Option<Attractor> {
        let mut z = Complex::ZERO;
        for _ in 0..u64::from(max_iterations) * 2 {
            z = self.step(z);
            if z.norm_sq() >= self.config.bailout {
                return None;
            }
        }

        let anchor = z;
        let mut z = anchor;
        for period in 1..=MAX_ATTRACTOR_PERIOD {
            z = self.step(z);
            if (z - anchor).norm_sq() < DEFAULT_ATTRACTOR_RADIUS {
                return Some(Attractor::new(anchor, period));
            }
        }
        None
    }
}

impl OrbitPlugin for JuliaPlugin {
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
        self.k
    }

    fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    fn per_image(&mut self, setup: &ImageSetup<'_>) -> Result<(), EngineError> {
        self.attractors.clear();
        if setup.find_attractors {
            if let Some(attractor) = self.find_attractor(setup.max_iterations) {
                log::debug!(
                    "julia attractor at ({}, {}) period {}",
                    attractor.point.re,
                    attractor.point.im,
                    attractor.period
                );
                self.attractors.push(attractor);
            }
        }
        Ok(())
    }

    fn per_pixel(&mut self, _col: i32, _row: i32, point: Complex) -> Complex {
        point
    }

    #[inline]
    fn orbit_step(&mut self, z: &mut Complex) -> bool {
        *z = self.step(*z);
        z.norm_sq() >= self.config.bailout
    }
}
