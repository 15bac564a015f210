use orbitscan_compute::{
    CalcMode, Canvas, Complex, ComplexRect, Engine, EngineConfig, FieldOrbit, OrbitPlugin,
};

const ALL_MODES: [CalcMode; 7] = [
    CalcMode::OnePass,
    CalcMode::TwoPass,
    CalcMode::ThreePass,
    CalcMode::SolidGuess,
    CalcMode::BoundaryTrace,
    CalcMode::Tesseral,
    CalcMode::Diffusion,
];

/// Vertical stripes about eight pixels wide on a 64 pixel canvas. The
/// right edge belongs to the last stripe.
fn stripes(p: Complex) -> u32 {
    (((p.re + 2.0) * 2.0) as u32).min(7) + 2
}

/// Rectangular cells, every cell its own color.
fn plaid(p: Complex) -> u32 {
    let col = ((p.re + 2.0) as u32).min(3);
    let row = ((p.im + 1.5) as u32).min(2);
    col + 4 * row + 2
}

fn config(mode: CalcMode) -> EngineConfig {
    EngineConfig::default()
        .with_size(64, 48)
        .with_rect(ComplexRect::new(-2.0, 2.0, -1.5, 1.5))
        .with_mode(mode)
}

fn render(mode: CalcMode, plugin: Box<dyn OrbitPlugin>) -> Canvas {
    let mut engine = Engine::new(config(mode), plugin).unwrap();
    let mut canvas = Canvas::new(64, 48);
    let outcome = engine.run(&mut canvas).unwrap();
    assert!(outcome.is_completed(), "{mode:?} did not complete");
    canvas
}

fn assert_matches_one_pass(field: fn(Complex) -> u32, modes: &[CalcMode]) {
    let expected = render(CalcMode::OnePass, Box::new(FieldOrbit::new(field)));
    assert_eq!(expected.count(0), 0);
    for &mode in modes {
        let canvas = render(mode, Box::new(FieldOrbit::new(field)));
        assert_eq!(canvas, expected, "{mode:?} differs from one pass");
    }
}

#[test]
fn every_mode_reproduces_stripes() {
    assert_matches_one_pass(stripes, &ALL_MODES);
}

#[test]
fn area_modes_reproduce_plaid() {
    assert_matches_one_pass(
        plaid,
        &[
            CalcMode::TwoPass,
            CalcMode::ThreePass,
            CalcMode::SolidGuess,
            CalcMode::Tesseral,
            CalcMode::Diffusion,
        ],
    );
}

#[test]
fn exhaustive_modes_reproduce_any_field() {
    // Two-pass, three-pass and diffusion compute every pixel in the end.
    assert_matches_one_pass(
        |p| ((p.re * 37.0).sin() * (p.im * 23.0).cos() * 20.0 + 30.0) as u32,
        &[CalcMode::TwoPass, CalcMode::ThreePass, CalcMode::Diffusion],
    );
}

#[test]
fn coherence_modes_save_work_on_flat_regions() {
    for mode in [
        CalcMode::SolidGuess,
        CalcMode::BoundaryTrace,
        CalcMode::Tesseral,
    ] {
        let mut engine = Engine::new(config(mode), Box::new(FieldOrbit::new(stripes))).unwrap();
        let mut canvas = Canvas::new(64, 48);
        engine.run(&mut canvas).unwrap();
        assert!(
            engine.stats().pixels_computed < 64 * 48,
            "{mode:?} computed {} pixels",
            engine.stats().pixels_computed
        );
    }
}

#[test]
fn diffusion_computes_each_pixel_once() {
    let mut engine = Engine::new(
        config(CalcMode::Diffusion),
        Box::new(FieldOrbit::new(plaid)),
    )
    .unwrap();
    let mut canvas = Canvas::new(64, 48);
    engine.run(&mut canvas).unwrap();
    assert_eq!(engine.stats().pixels_computed, 64 * 48);
}

#[test]
fn diffusion_points_only_matches_block_preview() {
    let points_only = EngineConfig {
        fill_color: Some(0),
        ..config(CalcMode::Diffusion)
    };
    let mut engine = Engine::new(points_only, Box::new(FieldOrbit::new(plaid))).unwrap();
    let mut canvas = Canvas::new(64, 48);
    assert!(engine.run(&mut canvas).unwrap().is_completed());
    assert_eq!(canvas, render(CalcMode::Diffusion, Box::new(FieldOrbit::new(plaid))));
}

#[test]
fn odd_canvas_sizes_are_fully_painted() {
    for (width, height) in [(1, 1), (3, 2), (17, 5), (33, 31), (70, 9)] {
        for mode in ALL_MODES {
            let cfg = EngineConfig::default()
                .with_size(width, height)
                .with_rect(ComplexRect::new(-2.0, 2.0, -1.5, 1.5))
                .with_mode(mode);
            let mut engine = Engine::new(cfg, Box::new(FieldOrbit::new(|_| 5))).unwrap();
            let mut canvas = Canvas::new(width, height);
            assert!(engine.run(&mut canvas).unwrap().is_completed());
            assert_eq!(
                canvas.count(5),
                (width * height) as usize,
                "{mode:?} on {width}x{height}"
            );
        }
    }
}
