//! Synthetic orbits with known answers.
//!
//! These plugins make the coherence algorithms testable: the escape
//! iteration of every pixel is a plain function of its point, orbits never
//! revisit a value unless they are meant to be periodic, and nothing
//! depends on floating-point chaos.

use crate::plugin::OrbitPlugin;
use orbitscan_core::{Complex, SymmetryKind};

/// Every orbit escapes after the same number of steps.
#[derive(Clone, Debug)]
pub struct ConstantEscape {
    iterations: u32,
    steps: u32,
}

impl ConstantEscape {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
            steps: 0,
        }
    }
}

impl OrbitPlugin for ConstantEscape {
    fn id(&self) -> &str {
        "constant_escape"
    }

    fn bailout(&self) -> f64 {
        4.0
    }

    fn per_pixel(&mut self, _col: i32, _row: i32, _point: Complex) -> Complex {
        self.steps = 0;
        Complex::ZERO
    }

    fn orbit_step(&mut self, z: &mut Complex) -> bool {
        self.steps += 1;
        z.re += 1.0;
        self.steps >= self.iterations
    }
}

/// Escape iteration given by a field over the plane.
///
/// The orbit walks `z.re` up by one per step, so it is strictly monotonic
/// and periodicity checking can never catch it. A field value at or above
/// the iteration cap makes the pixel an inside pixel.
#[derive(Clone, Debug)]
pub struct FieldOrbit {
    field: fn(Complex) -> u32,
    symmetry: SymmetryKind,
    target: u32,
    steps: u32,
}

impl FieldOrbit {
    pub fn new(field: fn(Complex) -> u32) -> Self {
        Self {
            field,
            symmetry: SymmetryKind::None,
            target: 0,
            steps: 0,
        }
    }

    pub fn with_symmetry(mut self, symmetry: SymmetryKind) -> Self {
        self.symmetry = symmetry;
        self
    }
}

impl OrbitPlugin for FieldOrbit {
    fn id(&self) -> &str {
        "field_orbit"
    }

    fn symmetry(&self) -> SymmetryKind {
        self.symmetry
    }

    fn bailout(&self) -> f64 {
        4.0
    }

    fn per_pixel(&mut self, _col: i32, _row: i32, point: Complex) -> Complex {
        self.target = (self.field)(point).max(1);
        self.steps = 0;
        Complex::ZERO
    }

    fn orbit_step(&mut self, z: &mut Complex) -> bool {
        self.steps += 1;
        z.re += 1.0;
        self.steps >= self.target
    }
}

/// Orbit that enters an exact cycle of the given length after a lead-in.
#[derive(Clone, Debug)]
pub struct PeriodicOrbit {
    period: u32,
    lead_in: u32,
    steps: u32,
}

impl PeriodicOrbit {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            lead_in: 0,
            steps: 0,
        }
    }

    pub fn with_lead_in(mut self, lead_in: u32) -> Self {
        self.lead_in = lead_in;
        self
    }

    /// Position `k` of the cycle, spread well apart on the unit circle.
    fn cycle_point(&self, k: u32) -> Complex {
        let angle = std::f64::consts::TAU * f64::from(k) / f64::from(self.period);
        Complex::new(angle.cos(), angle.sin())
    }
}

impl OrbitPlugin for PeriodicOrbit {
    fn id(&self) -> &str {
        "periodic_orbit"
    }

    fn bailout(&self) -> f64 {
        4.0
    }

    fn per_pixel(&mut self, _col: i32, _row: i32, _point: Complex) -> Complex {
        self.steps = 0;
        Complex::new(0.0, -10.0)
    }

    fn orbit_step(&mut self, z: &mut Complex) -> bool {
        self.steps += 1;
        *z = if self.steps <= self.lead_in {
            // Distinct values well away from the cycle.
            Complex::new(0.0, -f64::from(self.steps) - 10.0)
        } else {
            self.cycle_point((self.steps - self.lead_in) % self.period)
        };
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_escape_counts_steps() {
        let mut plugin = ConstantEscape::new(3);
        let mut z = plugin.per_pixel(0, 0, Complex::ZERO);
        assert!(!plugin.orbit_step(&mut z));
        assert!(!plugin.orbit_step(&mut z));
        assert!(plugin.orbit_step(&mut z));

        // Reseeding starts over.
        let mut z = plugin.per_pixel(1, 0, Complex::ZERO);
        assert!(!plugin.orbit_step(&mut z));
    }

    #[test]
    fn field_orbit_follows_field() {
        let mut plugin = FieldOrbit::new(|p| if p.re < 0.0 { 2 } else { 5 });
        let mut z = plugin.per_pixel(0, 0, Complex::new(-1.0, 0.0));
        let steps = (1..100).find(|_| plugin.orbit_step(&mut z));
        assert_eq!(steps, Some(2));

        let mut z = plugin.per_pixel(0, 0, Complex::new(1.0, 0.0));
        let steps = (1..100).find(|_| plugin.orbit_step(&mut z));
        assert_eq!(steps, Some(5));
    }

    #[test]
    fn periodic_orbit_repeats_exactly() {
        let mut plugin = PeriodicOrbit::new(3).with_lead_in(2);
        let mut z = plugin.per_pixel(0, 0, Complex::ZERO);
        let values: Vec<Complex> = (0..8)
            .map(|_| {
                plugin.orbit_step(&mut z);
                z
            })
            .collect();
        assert_ne!(values[0], values[1]);
        assert_eq!(values[2], values[5]);
        assert_eq!(values[3], values[6]);
        assert_ne!(values[2], values[3]);
    }
}
