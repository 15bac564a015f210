use orbitscan_compute::{
    CalcMode, CancelAfterPolls, Canvas, Complex, ComplexRect, Engine, EngineConfig, EngineError,
    FieldOrbit, MandelbrotPlugin, OrbitPlugin, ResumeBlob, RunOutcome, RunPhase, SymmetryKind,
    WorkItem, RESUME_VERSION,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALL_MODES: [CalcMode; 7] = [
    CalcMode::OnePass,
    CalcMode::TwoPass,
    CalcMode::ThreePass,
    CalcMode::SolidGuess,
    CalcMode::BoundaryTrace,
    CalcMode::Tesseral,
    CalcMode::Diffusion,
];

const MAX_RESUMES: usize = 2_000;

fn stripes(p: Complex) -> u32 {
    (((p.re + 2.0) * 2.0) as u32).min(7) + 2
}

fn config(mode: CalcMode) -> EngineConfig {
    EngineConfig {
        poll_interval: 40,
        ..EngineConfig::default()
            .with_size(64, 48)
            .with_rect(ComplexRect::new(-2.0, 2.0, -1.5, 1.5))
            .with_mode(mode)
    }
}

fn plugin(symmetry: SymmetryKind) -> Box<dyn OrbitPlugin> {
    Box::new(FieldOrbit::new(stripes).with_symmetry(symmetry))
}

/// A real fractal with periodicity checking on, so restarts have to carry
/// the iterator's cycle state.
fn mandelbrot_config(mode: CalcMode) -> EngineConfig {
    EngineConfig {
        poll_interval: 400,
        max_iterations: 150,
        ..EngineConfig::default()
            .with_size(64, 48)
            .with_rect(ComplexRect::new(-2.0, 1.0, -1.2, 1.2))
            .with_mode(mode)
    }
}

fn mandelbrot() -> Box<dyn OrbitPlugin> {
    Box::new(MandelbrotPlugin::new())
}

fn uninterrupted(cfg: &EngineConfig, plugin: Box<dyn OrbitPlugin>) -> Canvas {
    let mut engine = Engine::new(cfg.clone(), plugin).unwrap();
    let mut canvas = Canvas::new(cfg.width, cfg.height);
    assert!(engine.run(&mut canvas).unwrap().is_completed());
    canvas
}

/// Render with an abort after `limit()` polls, then keep resuming from the
/// serialized blob with fresh aborts until done.
fn interrupted(
    cfg: &EngineConfig,
    plugin: impl Fn() -> Box<dyn OrbitPlugin>,
    mut limit: impl FnMut() -> u64,
) -> (Canvas, usize) {
    let mut canvas = Canvas::new(cfg.width, cfg.height);
    let mut blob: Option<Vec<u8>> = None;
    let mut interruptions = 0;

    for _ in 0..MAX_RESUMES {
        let checker = CancelAfterPolls::new(limit());
        let mut engine = Engine::with_checker(cfg.clone(), plugin(), checker).unwrap();
        let outcome = match &blob {
            None => engine.run(&mut canvas).unwrap(),
            Some(bytes) => engine.resume_bytes(&mut canvas, bytes).unwrap(),
        };
        match outcome {
            RunOutcome::Completed => return (canvas, interruptions),
            RunOutcome::Interrupted(next) => {
                interruptions += 1;
                blob = Some(next.to_bytes().unwrap());
            }
        }
    }
    panic!("{:?} made no progress after {MAX_RESUMES} resumes", cfg.calc_mode);
}

#[test]
fn every_mode_resumes_to_the_uninterrupted_image() {
    let mut rng = StdRng::seed_from_u64(0x0b17_5ca9);
    for mode in ALL_MODES {
        let cfg = config(mode);
        let expected = uninterrupted(&cfg, plugin(SymmetryKind::None));
        let (canvas, interruptions) = interrupted(
            &cfg,
            || plugin(SymmetryKind::None),
            || rng.gen_range(1..12),
        );
        assert!(interruptions > 0, "{mode:?} was never interrupted");
        assert_eq!(canvas, expected, "{mode:?}");
    }
}

#[test]
fn mirrored_items_resume_to_the_uninterrupted_image() {
    let mut rng = StdRng::seed_from_u64(7);
    for mode in ALL_MODES {
        let cfg = config(mode);
        let expected = uninterrupted(&cfg, plugin(SymmetryKind::XAxis));
        let (canvas, _) = interrupted(
            &cfg,
            || plugin(SymmetryKind::XAxis),
            || rng.gen_range(1..12),
        );
        assert_eq!(canvas, expected, "{mode:?}");
    }
}

#[test]
fn mandelbrot_with_periodicity_resumes_to_the_uninterrupted_image() {
    let mut rng = StdRng::seed_from_u64(0x00c0_ffee);
    for mode in ALL_MODES {
        let cfg = mandelbrot_config(mode);
        assert!(cfg.periodicity_check > 0);
        let expected = uninterrupted(&cfg, mandelbrot());
        let (canvas, interruptions) = interrupted(&cfg, mandelbrot, || rng.gen_range(1..12));
        assert!(interruptions > 0, "{mode:?} was never interrupted");
        assert_eq!(canvas, expected, "{mode:?}");
    }
}

#[test]
fn stopping_at_the_first_poll_of_every_run_still_finishes() {
    for mode in [
        CalcMode::OnePass,
        CalcMode::SolidGuess,
        CalcMode::BoundaryTrace,
        CalcMode::Tesseral,
    ] {
        let cfg = mandelbrot_config(mode);
        let expected = uninterrupted(&cfg, mandelbrot());
        let (canvas, interruptions) = interrupted(&cfg, mandelbrot, || 0);
        assert!(interruptions > 1, "{mode:?}");
        assert_eq!(canvas, expected, "{mode:?}");
    }
}

#[test]
fn interrupted_blob_carries_the_pixel_in_flight() {
    let cfg = mandelbrot_config(CalcMode::OnePass);
    let mut engine =
        Engine::with_checker(cfg.clone(), mandelbrot(), CancelAfterPolls::new(0)).unwrap();
    let mut canvas = Canvas::new(64, 48);
    let blob = engine.run(&mut canvas).unwrap().resume_blob().cloned().unwrap();

    assert_eq!(blob.progress.len(), 1);
    let record = &blob.progress[0];
    assert!(blob.items.contains(&record.item));
    assert_eq!(record.pixels.len(), 1);
    let pixel = record.pixels[0];
    assert_eq!(canvas.row(pixel.y)[pixel.x as usize], pixel.color);

    let json = serde_json::to_string(&blob).unwrap();
    let back: ResumeBlob = serde_json::from_str(&json).unwrap();
    assert_eq!(back, blob);

    let mut fresh = Engine::new(cfg, mandelbrot()).unwrap();
    assert!(fresh.resume(&mut canvas, &blob).unwrap().is_completed());
    assert_eq!(fresh.stats().pixels_replayed, 1);
}

#[test]
fn interrupted_blob_survives_serialization() {
    let checker = CancelAfterPolls::new(3);
    let mut engine =
        Engine::with_checker(config(CalcMode::Tesseral), plugin(SymmetryKind::None), checker)
            .unwrap();
    let mut canvas = Canvas::new(64, 48);
    let outcome = engine.run(&mut canvas).unwrap();
    let blob = outcome.resume_blob().cloned().unwrap();
    assert_eq!(blob.version, RESUME_VERSION);
    assert_eq!(blob.phase, RunPhase::Single);

    let json = serde_json::to_string(&blob).unwrap();
    let back: ResumeBlob = serde_json::from_str(&json).unwrap();
    assert_eq!(back, blob);
}

#[test]
fn three_pass_interrupt_records_its_phase() {
    let checker = CancelAfterPolls::new(2);
    let mut engine =
        Engine::with_checker(config(CalcMode::ThreePass), plugin(SymmetryKind::None), checker)
            .unwrap();
    let mut canvas = Canvas::new(64, 48);
    let blob = engine.run(&mut canvas).unwrap().resume_blob().cloned().unwrap();
    assert_eq!(blob.phase, RunPhase::ThreePassGuess);
}

#[test]
fn corrupt_blobs_are_rejected() {
    let mut engine = Engine::new(config(CalcMode::OnePass), plugin(SymmetryKind::None)).unwrap();
    let mut canvas = Canvas::new(64, 48);

    assert!(engine.resume_bytes(&mut canvas, b"not a blob").is_err());

    let mut blob = ResumeBlob::new(64, 48, RunPhase::Single, vec![WorkItem::canvas(64, 48)]);
    blob.version = RESUME_VERSION + 1;
    assert!(matches!(
        engine.resume(&mut canvas, &blob),
        Err(EngineError::ResumeVersion { .. })
    ));

    let outside = WorkItem::new(0, 100, 0, 47);
    let blob = ResumeBlob::new(64, 48, RunPhase::Single, vec![outside]);
    assert!(engine.resume(&mut canvas, &blob).is_err());
    assert_eq!(canvas.count(0), 64 * 48);
}

#[test]
fn blob_without_work_is_corrupt() {
    let mut engine = Engine::new(config(CalcMode::OnePass), plugin(SymmetryKind::None)).unwrap();
    let mut canvas = Canvas::new(64, 48);
    let blob = ResumeBlob::new(64, 48, RunPhase::Single, Vec::new());
    assert!(matches!(
        engine.resume(&mut canvas, &blob),
        Err(EngineError::ResumeCorrupt(_))
    ));
    assert_eq!(engine.stats().pixels_computed, 0);
}
