//! Approximate cycle detection for a single orbit.
//!
//! The orbit value is saved at exponentially spaced iterations. Every
//! iteration in between is compared against the last saved value; a match
//! within `close_enough` on both axes is a caught cycle.

use orbitscan_core::Complex;

/// Sample spacing derived from the iteration cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodicitySchedule {
    /// Saves made at one window size before the window doubles.
    pub next_saved_incr: u64,
    /// Initial AND-mask window; checking never starts before this iteration.
    pub first_saved_and: u64,
}

impl PeriodicitySchedule {
    pub fn for_max_iterations(max_iterations: u32) -> Self {
        let next_saved_incr = (f64::from(max_iterations.max(1)).log10() as u64).max(4);
        Self {
            next_saved_incr,
            first_saved_and: next_saved_incr * 2 + 1,
        }
    }
}

/// Mask window used when inside pixels are colored by their period.
const PERIOD_COLORING_SAVED_AND: u64 = 16;

#[derive(Clone, Debug)]
pub struct PeriodicityTracker {
    schedule: PeriodicitySchedule,
    close_enough: f64,
    saved: Complex,
    saved_iter: u64,
    saved_and: u64,
    saved_incr: u64,
}

impl PeriodicityTracker {
    pub fn new(schedule: PeriodicitySchedule, close_enough: f64) -> Self {
        Self {
            schedule,
            close_enough,
            saved: Complex::ZERO,
            saved_iter: 0,
            saved_and: schedule.first_saved_and,
            saved_incr: 1,
        }
    }

    pub fn schedule(&self) -> PeriodicitySchedule {
        self.schedule
    }

    pub fn close_enough(&self) -> f64 {
        self.close_enough
    }

    /// Reset for a new orbit.
    pub fn start(&mut self, period_coloring: bool) {
        self.saved = Complex::ZERO;
        self.saved_iter = 0;
        self.saved_and = if period_coloring {
            PERIOD_COLORING_SAVED_AND
        } else {
            self.schedule.first_saved_and
        };
        self.saved_incr = 1;
    }

    /// Feed the orbit value reached at iteration `iter`. Returns the cycle
    /// length when `z` closes a cycle.
    pub fn observe(&mut self, iter: u64, z: Complex) -> Option<u64> {
        if iter & self.saved_and == 0 {
            self.saved = z;
            self.saved_iter = iter;
            self.saved_incr -= 1;
            if self.saved_incr == 0 {
                self.saved_and = (self.saved_and << 1) + 1;
                self.saved_incr = self.schedule.next_saved_incr;
            }
            None
        } else if (self.saved.re - z.re).abs() < self.close_enough
            && (self.saved.im - z.im).abs() < self.close_enough
        {
            Some(iter - self.saved_iter)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_has_a_floor_of_four() {
        let schedule = PeriodicitySchedule::for_max_iterations(150);
        assert_eq!(schedule.next_saved_incr, 4);
        assert_eq!(schedule.first_saved_and, 9);
    }

    #[test]
    fn schedule_follows_log10_for_large_caps() {
        let schedule = PeriodicitySchedule::for_max_iterations(3_000_000);
        assert_eq!(schedule.next_saved_incr, 6);
        assert_eq!(schedule.first_saved_and, 13);
    }

    #[test]
    fn fixed_point_is_caught() {
        let mut tracker =
            PeriodicityTracker::new(PeriodicitySchedule::for_max_iterations(150), 1e-10);
        tracker.start(false);
        let z = Complex::new(0.25, 0.5);
        let caught = (1..200u64).find_map(|iter| tracker.observe(iter, z));
        assert!(caught.is_some());
    }

    #[test]
    fn moving_orbit_is_never_caught() {
        let mut tracker =
            PeriodicityTracker::new(PeriodicitySchedule::for_max_iterations(150), 1e-10);
        tracker.start(false);
        let caught =
            (1..10_000u64).find_map(|iter| tracker.observe(iter, Complex::new(iter as f64, 0.0)));
        assert_eq!(caught, None);
    }

    #[test]
    fn window_doubles_after_next_saved_incr_saves() {
        let mut tracker =
            PeriodicityTracker::new(PeriodicitySchedule::for_max_iterations(150), 1e-10);
        tracker.start(false);
        // Mask 9 saves at multiples of 16 (low bits clear); the first save
        // widens the window immediately because the counter starts at 1.
        tracker.observe(16, Complex::ZERO);
        assert_eq!(tracker.saved_and, 19);
        assert_eq!(tracker.saved_incr, 4);
    }
}
