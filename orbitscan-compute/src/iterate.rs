//! Pixel iterator core.
//!
//! Runs one orbit to escape, capture or the iteration cap, with periodicity
//! checking, then turns the result into a palette index.

use crate::cancellation::Interrupted;
use crate::periodicity::{PeriodicitySchedule, PeriodicityTracker};
use crate::plugin::{Attractor, OrbitPlugin};
use orbitscan_core::{
    Complex, EngineConfig, FiniteAttractor, InsideColoring, OrbitCarry, OutsideColoring,
    PixelOutcome,
};
use std::f64::consts::PI;

/// Orbit iterations between abort polls inside one orbit.
pub const CHECK_FREQ: u64 = 2048;

/// Row-start delay before periodicity checking begins.
const ROW_START_CHECK_DELAY: u64 = 255;

/// Color shown for caught cycles when `periodicity_check` is negative.
const CAUGHT_CYCLE_COLOR: i64 = 7;

#[derive(Clone, Debug)]
pub struct PixelIterator {
    max_iterations: u64,
    colors: u32,
    inside: InsideColoring,
    outside: OutsideColoring,
    periodicity_check: i32,
    finite_attractor: FiniteAttractor,
    boundary_trace: bool,
    tracker: PeriodicityTracker,
    attractors: Vec<Attractor>,
    /// Iteration after which the next orbit starts checking for cycles.
    old_color_iter: u64,
    reset_periodicity: bool,
}

impl PixelIterator {
    pub fn new(config: &EngineConfig, min_pixel_delta: f64) -> Self {
        let schedule = PeriodicitySchedule::for_max_iterations(config.max_iterations);
        let shift = f64::from(config.periodicity_check.unsigned_abs());
        Self {
            max_iterations: u64::from(config.max_iterations),
            colors: config.colors,
            inside: config.inside,
            outside: config.outside,
            periodicity_check: config.periodicity_check,
            finite_attractor: config.finite_attractor,
            boundary_trace: false,
            tracker: PeriodicityTracker::new(schedule, min_pixel_delta * (-shift).exp2()),
            attractors: Vec::new(),
            old_color_iter: 0,
            reset_periodicity: true,
        }
    }

    /// Boundary tracing cannot tell color 0 from "unpainted".
    pub fn set_boundary_trace(&mut self, on: bool) {
        self.boundary_trace = on;
    }

    pub fn set_attractors(&mut self, attractors: &[Attractor]) {
        self.attractors.clear();
        if self.finite_attractor != FiniteAttractor::Off {
            self.attractors.extend_from_slice(attractors);
        }
    }

    /// Start the next orbit with the row-start periodicity delay.
    pub fn set_reset_periodicity(&mut self, on: bool) {
        self.reset_periodicity = on;
    }

    pub fn carry(&self) -> OrbitCarry {
        OrbitCarry {
            reset_periodicity: self.reset_periodicity,
            old_color_iter: self.old_color_iter,
        }
    }

    pub fn restore(&mut self, carry: OrbitCarry) {
        self.reset_periodicity = carry.reset_periodicity;
        self.old_color_iter = carry.old_color_iter;
    }

    /// Take over the state an orbit left behind without running it.
    pub(crate) fn set_old_color_iter(&mut self, old_color_iter: u64) {
        self.old_color_iter = old_color_iter;
    }

    pub fn close_enough(&self) -> f64 {
        self.tracker.close_enough()
    }

    fn check_delay(&self) -> u64 {
        let delay = if self.periodicity_check == 0 || self.inside == InsideColoring::ZMag {
            u64::MAX
        } else if self.inside == InsideColoring::Period {
            self.max_iterations / 5 * 4
        } else if self.reset_periodicity {
            ROW_START_CHECK_DELAY
        } else {
            self.old_color_iter
        };
        delay.max(self.tracker.schedule().first_saved_and)
    }

    /// Iterate pixel `(col, row)` at `point`.
    ///
    /// `poll` is consulted every [`CHECK_FREQ`] iterations; a positive poll
    /// abandons the orbit.
    pub fn evaluate(
        &mut self,
        plugin: &mut dyn OrbitPlugin,
        col: i32,
        row: i32,
        point: Complex,
        poll: &mut dyn FnMut() -> bool,
    ) -> Result<PixelOutcome, Interrupted> {
        let max = self.max_iterations;
        let check_after = self.check_delay();
        self.tracker.start(self.inside == InsideColoring::Period);

        let mut z = plugin.per_pixel(col, row, point);
        let mut iter: u64 = 0;
        let mut steps: u64 = 0;
        let mut attracted = false;
        let mut period = None;

        loop {
            iter += 1;
            if iter >= max {
                break;
            }
            if iter % CHECK_FREQ == 0 && poll() {
                return Err(Interrupted);
            }

            steps += 1;
            if plugin.orbit_step(&mut z) {
                break;
            }

            if let Some(attractor) = self.attractors.iter().find(|a| a.captures(z)) {
                attracted = true;
                if self.finite_attractor == FiniteAttractor::Phase {
                    iter = iter % attractor.period.max(1) + 1;
                }
                break;
            }

            if iter > check_after {
                if let Some(cycle) = self.tracker.observe(iter, z) {
                    period = Some(cycle);
                    iter = max - 1;
                }
            }
        }

        if iter >= max {
            self.old_color_iter = 0;
        } else {
            self.old_color_iter = iter + 10;
            if iter == 0 {
                iter = 1;
            }
        }

        let escaped = iter < max;
        let color_iter = if escaped {
            self.outside_color(iter as i64, z, attracted)
        } else {
            self.inside_color(z, period)
        };

        let mut color = palette_index(color_iter, self.colors);
        if color == 0 && self.boundary_trace {
            // Leniency kept for compatibility: boundary tracing would read 0
            // back as an unpainted pixel.
            color = 1;
        }
        debug_assert!(!self.boundary_trace || color < self.colors.max(2));

        Ok(PixelOutcome::new(color, steps, escaped, attracted, period, z))
    }

    fn outside_color(&self, iter: i64, z: Complex, attracted: bool) -> i64 {
        let mut color = iter;
        if self.outside.uses_final_orbit() {
            match self.outside {
                OutsideColoring::Real => color += z.re as i64 + 7,
                OutsideColoring::Imag => color += z.im as i64 + 7,
                OutsideColoring::Mult => {
                    if z.im != 0.0 {
                        color = (color as f64 * (z.re / z.im)) as i64;
                    }
                }
                OutsideColoring::Sum => color += (z.re + z.im) as i64,
                OutsideColoring::Atan => color = self.atan_color(z),
                OutsideColoring::Iteration | OutsideColoring::Color(_) => {}
            }
            if color <= 0 || color > self.max_iterations as i64 {
                color = 1;
            }
        }
        if let OutsideColoring::Color(fixed) = self.outside {
            if !attracted {
                color = i64::from(fixed);
            }
        }
        color
    }

    fn inside_color(&self, z: Complex, period: Option<u64>) -> i64 {
        if self.periodicity_check < 0 && period.is_some() {
            return CAUGHT_CYCLE_COLOR;
        }
        let max = self.max_iterations as i64;
        match self.inside {
            InsideColoring::Color(fixed) => i64::from(fixed),
            InsideColoring::MaxIter => max,
            InsideColoring::Period => period.map_or(max, |p| p as i64),
            InsideColoring::ZMag => (z.norm_sq() * (max >> 1) as f64 + 1.0) as i64,
            InsideColoring::Atan => self.atan_color(z),
        }
    }

    fn atan_color(&self, z: Complex) -> i64 {
        (z.im.atan2(z.re) * f64::from(self.colors) / PI).abs() as i64
    }
}

/// Fold an iteration-derived color into the palette. Values below `colors`
/// pass through untouched; larger ones wrap, skipping color 0 for
/// palettes of 16 or more colors.
pub fn palette_index(color_iter: i64, colors: u32) -> u32 {
    let colors = i64::from(colors.max(2));
    let and_color = colors - 1;
    let color = if color_iter >= colors {
        if colors < 16 {
            color_iter & and_color
        } else {
            (color_iter - 1) % and_color + 1
        }
    } else {
        color_iter.abs()
    };
    u32::try_from(color).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computers::{ConstantEscape, FieldOrbit, PeriodicOrbit};

    fn never() -> impl FnMut() -> bool {
        || false
    }

    fn iterator(config: &EngineConfig) -> PixelIterator {
        PixelIterator::new(config, 0.01)
    }

    #[test]
    fn palette_passes_small_values_through() {
        assert_eq!(palette_index(5, 256), 5);
        assert_eq!(palette_index(0, 256), 0);
        assert_eq!(palette_index(-3, 256), 3);
    }

    #[test]
    fn palette_wraps_skipping_zero() {
        assert_eq!(palette_index(256, 256), 1);
        assert_eq!(palette_index(255, 256), 255);
        assert_eq!(palette_index(510, 256), 255);
        assert_eq!(palette_index(511, 256), 1);
    }

    #[test]
    fn small_palettes_mask() {
        assert_eq!(palette_index(8, 8), 0);
        assert_eq!(palette_index(13, 8), 5);
    }

    #[test]
    fn escape_iteration_is_the_color() {
        let config = EngineConfig::default();
        let mut it = iterator(&config);
        let mut plugin = FieldOrbit::new(|_| 17);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert!(out.escaped);
        assert_eq!(out.color, 17);
        assert_eq!(out.iterations, 17);
    }

    #[test]
    fn inside_uses_inside_color() {
        let config = EngineConfig {
            max_iterations: 50,
            inside: InsideColoring::Color(3),
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = FieldOrbit::new(|_| 1000);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert!(!out.escaped);
        assert_eq!(out.color, 3);
        assert_eq!(out.iterations, 49);
    }

    #[test]
    fn max_iter_inside_wraps_into_palette() {
        let config = EngineConfig {
            max_iterations: 300,
            inside: InsideColoring::MaxIter,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = FieldOrbit::new(|_| 1000);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert_eq!(out.color, palette_index(300, 256));
    }

    #[test]
    fn outside_fixed_color_overrides_iteration() {
        let config = EngineConfig {
            outside: OutsideColoring::Color(9),
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = ConstantEscape::new(4);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert_eq!(out.color, 9);
    }

    #[test]
    fn caught_cycle_reports_period() {
        let config = EngineConfig {
            max_iterations: 1000,
            inside: InsideColoring::Period,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = PeriodicOrbit::new(5);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert!(!out.escaped);
        assert_eq!(out.period.map(|p| p % 5), Some(0));
        assert_eq!(u64::from(out.color) % 5, 0);
        assert!(out.iterations < 999);
    }

    #[test]
    fn negative_periodicity_check_shows_cycles_as_seven() {
        let config = EngineConfig {
            max_iterations: 1000,
            periodicity_check: -1,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = PeriodicOrbit::new(3);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert_eq!(out.color, 7);
    }

    #[test]
    fn periodicity_off_runs_to_the_cap() {
        let config = EngineConfig {
            max_iterations: 500,
            periodicity_check: 0,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = PeriodicOrbit::new(3);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert_eq!(out.period, None);
        assert_eq!(out.iterations, 499);
    }

    #[test]
    fn long_orbit_polls_and_stops() {
        let config = EngineConfig {
            max_iterations: 10_000,
            periodicity_check: 0,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        let mut plugin = FieldOrbit::new(|_| 1_000_000);
        let mut polls = 0;
        let mut poll = || {
            polls += 1;
            true
        };
        let out = it.evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut poll);
        assert_eq!(out, Err(Interrupted));
        assert_eq!(polls, 1);
    }

    #[test]
    fn attractor_capture_counts_as_escape() {
        let config = EngineConfig {
            finite_attractor: FiniteAttractor::On,
            outside: OutsideColoring::Color(9),
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        it.set_attractors(&[Attractor::new(Complex::new(3.0, 0.0), 1)]);
        // z.re walks 1, 2, 3: captured on the third step.
        let mut plugin = FieldOrbit::new(|_| 100);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert!(out.escaped);
        assert!(out.attracted);
        // Attracted pixels keep their iteration color.
        assert_eq!(out.color, 3);
    }

    #[test]
    fn phase_attractor_coloring() {
        let config = EngineConfig {
            finite_attractor: FiniteAttractor::Phase,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        it.set_attractors(&[Attractor::new(Complex::new(5.0, 0.0), 2)]);
        let mut plugin = FieldOrbit::new(|_| 100);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        // Captured at iteration 5: 5 % 2 + 1.
        assert_eq!(out.color, 2);
    }

    #[test]
    fn attractors_ignored_when_off() {
        let config = EngineConfig::default();
        let mut it = iterator(&config);
        it.set_attractors(&[Attractor::new(Complex::new(3.0, 0.0), 1)]);
        let mut plugin = FieldOrbit::new(|_| 10);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert!(!out.attracted);
        assert_eq!(out.color, 10);
    }

    #[test]
    fn boundary_trace_never_paints_zero() {
        let config = EngineConfig {
            inside: InsideColoring::Color(0),
            max_iterations: 20,
            ..EngineConfig::default()
        };
        let mut it = iterator(&config);
        it.set_boundary_trace(true);
        let mut plugin = FieldOrbit::new(|_| 1000);
        let out = it
            .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert_eq!(out.color, 1);
    }

    #[test]
    fn restored_carry_continues_the_chain() {
        let config = EngineConfig {
            max_iterations: 1000,
            ..EngineConfig::default()
        };
        let mut first = iterator(&config);
        first
            .evaluate(&mut FieldOrbit::new(|_| 30), 0, 0, Complex::ZERO, &mut never())
            .unwrap();
        first.set_reset_periodicity(false);
        let carry = first.carry();
        assert_eq!(
            carry,
            OrbitCarry {
                reset_periodicity: false,
                old_color_iter: 40
            }
        );
        let expected = first
            .evaluate(&mut PeriodicOrbit::new(3), 1, 0, Complex::ZERO, &mut never())
            .unwrap();

        let mut second = iterator(&config);
        second.restore(carry);
        let out = second
            .evaluate(&mut PeriodicOrbit::new(3), 1, 0, Complex::ZERO, &mut never())
            .unwrap();
        assert_eq!(out, expected);
        assert_eq!(second.carry(), first.carry());
    }

    #[test]
    fn close_enough_scales_with_periodicity_check() {
        let config = EngineConfig {
            periodicity_check: 3,
            ..EngineConfig::default()
        };
        let it = PixelIterator::new(&config, 1.0);
        assert_eq!(it.close_enough(), 0.125);
    }
}
