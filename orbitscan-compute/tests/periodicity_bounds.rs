use orbitscan_compute::iterate::PixelIterator;
use orbitscan_compute::{Complex, EngineConfig, FieldOrbit, PeriodicOrbit};

fn iterator(max_iterations: u32) -> PixelIterator {
    let config = EngineConfig {
        max_iterations,
        ..EngineConfig::default()
    };
    let mut it = PixelIterator::new(&config, 0.01);
    it.set_reset_periodicity(false);
    it
}

#[test]
fn cycles_are_caught_within_log_bound() {
    for max_iterations in [1_000u32, 10_000, 100_000] {
        let log_max = f64::from(max_iterations).log2();
        for period in 1..=64u32 {
            for lead_in in [0u32, 7, 50, 333] {
                let mut it = iterator(max_iterations);
                let mut plugin = PeriodicOrbit::new(period).with_lead_in(lead_in);
                let out = it
                    .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut || false)
                    .unwrap();

                assert!(!out.escaped);
                let caught = out.period.unwrap_or(0);
                assert!(caught > 0 && caught % u64::from(period) == 0);

                let extra = out.iterations as f64 - f64::from(lead_in);
                let bound = 4.0 * f64::from(period) * log_max;
                assert!(
                    extra <= bound,
                    "period {period} lead-in {lead_in} max {max_iterations}: {extra} > {bound}"
                );
            }
        }
    }
}

#[test]
fn diverging_orbits_run_to_their_escape() {
    for max_iterations in [150u32, 5_000] {
        let mut it = iterator(max_iterations);
        for target in (1..max_iterations).step_by(7) {
            // The field reads the escape iteration off the point.
            let mut plugin = FieldOrbit::new(|p| p.re as u32);
            let point = Complex::new(f64::from(target), 0.0);
            let out = it
                .evaluate(&mut plugin, 0, 0, point, &mut || false)
                .unwrap();
            assert!(out.escaped, "target {target}");
            assert_eq!(out.iterations, u64::from(target));
            assert_eq!(out.period, None);
        }
    }
}

#[test]
fn cycle_detection_off_never_shortens_orbits() {
    let config = EngineConfig {
        max_iterations: 2_000,
        periodicity_check: 0,
        ..EngineConfig::default()
    };
    let mut it = PixelIterator::new(&config, 0.01);
    let mut plugin = PeriodicOrbit::new(2);
    let out = it
        .evaluate(&mut plugin, 0, 0, Complex::ZERO, &mut || false)
        .unwrap();
    assert_eq!(out.iterations, 1_999);
    assert_eq!(out.period, None);
}
