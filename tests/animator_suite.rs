use mandala_tui::animator::{
    AnimationHandle, AnimatorError, AnimatorInstance, AnimatorState, FrameQueue, FrameScheduler, TIME_QUANTUM,
};
use mandala_tui::color::{resolve_color, Color};
use mandala_tui::config::{
    ColorScheme, MandalaConfig, PatternType, RenderOptions, ENGINE_LAYERS_MAX, ENGINE_REPEATS_MAX,
};
use mandala_tui::geometry::Point2D;
use mandala_tui::surface::{DrawSurface, RecordingSurface, SurfaceOp};

/// Scheduler double that counts every request and cancellation.
#[derive(Default)]
struct CountingScheduler {
    queue: FrameQueue,
    requested: usize,
    canceled: usize,
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&mut self) -> AnimationHandle {
        self.requested += 1;
        self.queue.request_frame()
    }

    fn cancel_frame(&mut self, handle: AnimationHandle) {
        self.canceled += 1;
        self.queue.cancel_frame(handle);
    }
}

fn config(pattern: PatternType, layers: u32, repeats: u32, speed: f64) -> MandalaConfig {
    MandalaConfig {
        pattern,
        layers,
        repeats_per_layer: repeats,
        size: 400.0,
        color_scheme: ColorScheme::Rainbow,
        rotation_speed: speed,
    }
}

fn started(cfg: MandalaConfig, options: RenderOptions, sched: &mut dyn FrameScheduler) -> AnimatorInstance<RecordingSurface> {
    let mut a = AnimatorInstance::new(RecordingSurface::new(100, 100), cfg, options);
    a.start(sched).expect("start should succeed");
    a
}

/// Fire every due frame `n` times; returns how many ticks were accepted.
fn pump(a: &mut AnimatorInstance<RecordingSurface>, sched: &mut CountingScheduler, n: usize) -> usize {
    let mut accepted = 0;
    for _ in 0..n {
        for h in sched.queue.take_due() {
            if a.on_frame(h, sched) {
                accepted += 1;
            }
        }
    }
    accepted
}

#[test]
fn new_instance_is_idle() {
    let a = AnimatorInstance::new(
        RecordingSurface::new(10, 10),
        MandalaConfig::default(),
        RenderOptions::default(),
    );
    assert_eq!(a.state(), AnimatorState::Idle);
    assert_eq!(a.rotation().radians(), 0.0);
    assert!(a.handle().is_none());
}

#[test]
fn start_schedules_exactly_one_frame() {
    let mut sched = CountingScheduler::default();
    let a = started(MandalaConfig::default(), RenderOptions::default(), &mut sched);
    assert_eq!(a.state(), AnimatorState::Running);
    assert_eq!(sched.requested, 1);
    assert_eq!(sched.queue.pending(), 1);
    assert!(a.surface().ops().is_empty(), "nothing is drawn before the first tick");
}

#[test]
fn each_tick_reschedules_one_frame() {
    let mut sched = CountingScheduler::default();
    let mut a = started(MandalaConfig::default(), RenderOptions::default(), &mut sched);
    assert_eq!(pump(&mut a, &mut sched, 10), 10);
    assert_eq!(sched.requested, 11);
    assert_eq!(sched.queue.pending(), 1);
    assert_eq!(a.frames_drawn(), 10);
}

#[test]
fn rotation_accumulates_speed_times_quantum() {
    let mut sched = CountingScheduler::default();
    let speed = 2.5;
    let mut a = started(config(PatternType::Stars, 3, 6, speed), RenderOptions::default(), &mut sched);
    let n = 240;
    pump(&mut a, &mut sched, n);
    let expected = n as f64 * speed * TIME_QUANTUM;
    assert!((a.rotation().radians() - expected).abs() < 1e-9);
}

#[test]
fn negative_speed_rotates_backwards() {
    let mut sched = CountingScheduler::default();
    let mut a = started(config(PatternType::Waves, 2, 5, -1.0), RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 50);
    assert!((a.rotation().radians() + 0.05).abs() < 1e-9);
}

#[test]
fn stop_cancels_the_pending_frame() {
    let mut sched = CountingScheduler::default();
    let mut a = started(MandalaConfig::default(), RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 3);
    let ticks = a.ticks();

    a.stop(&mut sched);
    assert_eq!(a.state(), AnimatorState::Stopped);
    assert_eq!(sched.canceled, 1);
    assert_eq!(sched.queue.pending(), 0);

    assert_eq!(pump(&mut a, &mut sched, 20), 0);
    assert_eq!(a.ticks(), ticks, "no frame callback after stop");
}

#[test]
fn stale_handles_are_ignored_after_stop() {
    let mut sched = CountingScheduler::default();
    let mut a = started(MandalaConfig::default(), RenderOptions::default(), &mut sched);
    let handle = a.handle().expect("running instance owns a handle");
    a.stop(&mut sched);
    assert!(!a.on_frame(handle, &mut sched));
    assert_eq!(a.frames_drawn(), 0);
}

#[test]
fn restart_on_config_change_resets_rotation() {
    let mut sched = CountingScheduler::default();
    let mut old = started(config(PatternType::Petals, 4, 8, 3.0), RenderOptions::default(), &mut sched);
    pump(&mut old, &mut sched, 30);
    let old_handle = old.handle().expect("old handle");
    assert!(old.rotation().radians() > 0.0);

    old.stop(&mut sched);
    let mut new = started(config(PatternType::Petals, 4, 8, 4.0), RenderOptions::default(), &mut sched);
    assert_eq!(new.rotation().radians(), 0.0);
    assert!(!new.on_frame(old_handle, &mut sched), "handle of the old instance is not ours");

    assert_eq!(pump(&mut new, &mut sched, 5), 5);
    assert_eq!(sched.queue.pending(), 1, "one live handle across both instances");
}

#[test]
fn stopped_instance_cannot_restart() {
    let mut sched = CountingScheduler::default();
    let mut a = started(MandalaConfig::default(), RenderOptions::default(), &mut sched);
    a.stop(&mut sched);
    assert_eq!(a.start(&mut sched), Err(AnimatorError::Stopped));
    assert_eq!(sched.queue.pending(), 0);
}

#[test]
fn missing_surface_prevents_start() {
    let mut sched = CountingScheduler::default();
    let mut a = AnimatorInstance::new(
        RecordingSurface::new(0, 0),
        MandalaConfig::default(),
        RenderOptions::default(),
    );
    let err = a.start(&mut sched).expect_err("zero-sized surface must fail");
    assert_eq!(err, AnimatorError::SurfaceUnavailable { width: 0, height: 0 });
    assert_eq!(a.state(), AnimatorState::Idle);
    assert_eq!(sched.requested, 0);
}

#[test]
fn frame_draws_background_transform_and_every_layer() {
    let mut sched = CountingScheduler::default();
    let layers = 5;
    let mut a = started(config(PatternType::Diamonds, layers, 6, 1.0), RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 1);

    let ops = a.surface().ops();
    assert_eq!(ops[0], SurfaceOp::Clear { width: 400.0, height: 400.0 });
    assert_eq!(ops[1], SurfaceOp::FillBackground(Color::WHITE));
    assert_eq!(
        ops[2],
        SurfaceOp::SetTransform {
            pivot: Point2D::new(200.0, 200.0),
            angle: 0.0
        }
    );
    assert_eq!(ops.last(), Some(&SurfaceOp::ResetTransform));

    let s = a.surface();
    assert_eq!(s.count(|op| *op == SurfaceOp::BeginPath), layers as usize);
    assert_eq!(s.count(|op| *op == SurfaceOp::ClosePath), layers as usize);
    assert_eq!(
        s.count(|op| *op
            == SurfaceOp::Stroke {
                style: Color::BLACK,
                width: 2.0
            }),
        layers as usize
    );
    assert_eq!(s.count(|op| *op == SurfaceOp::Fill(Color::TRANSPARENT)), layers as usize);
    assert_eq!(s.count(|op| matches!(op, SurfaceOp::MoveTo(_))), layers as usize);
}

#[test]
fn second_frame_uses_advanced_rotation() {
    let mut sched = CountingScheduler::default();
    let mut a = started(config(PatternType::Circles, 1, 4, 2.0), RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 1);
    a.surface_mut().take_ops();
    pump(&mut a, &mut sched, 1);
    match a.surface().ops()[2] {
        SurfaceOp::SetTransform { angle, .. } => assert!((angle - 0.002).abs() < 1e-12),
        ref other => panic!("expected transform, got {other:?}"),
    }
}

#[test]
fn zero_speed_redraws_identical_frames() {
    let mut sched = CountingScheduler::default();
    let mut a = started(config(PatternType::Petals, 3, 12, 0.0), RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 1);
    let first = a.surface_mut().take_ops();
    pump(&mut a, &mut sched, 4);
    assert_eq!(a.rotation().radians(), 0.0);
    assert_eq!(a.frames_drawn(), 5, "frames keep redrawing while frozen");

    let rest = a.surface_mut().take_ops();
    assert_eq!(rest.len(), first.len() * 4);
    for chunk in rest.chunks(first.len()) {
        assert_eq!(chunk, first.as_slice());
    }
}

#[test]
fn static_redraw_can_be_skipped() {
    let mut sched = CountingScheduler::default();
    let options = RenderOptions {
        skip_static_redraw: true,
        ..RenderOptions::default()
    };
    let mut a = started(config(PatternType::Stars, 2, 5, 0.0), options, &mut sched);
    assert_eq!(pump(&mut a, &mut sched, 6), 6);
    assert_eq!(a.ticks(), 6);
    assert_eq!(a.frames_drawn(), 1);
    assert_eq!(sched.queue.pending(), 1, "the loop keeps running");
}

#[test]
fn colorize_strokes_with_the_scheme() {
    let mut sched = CountingScheduler::default();
    let options = RenderOptions {
        colorize: true,
        fill_alpha: 0.25,
        ..RenderOptions::default()
    };
    let layers = 3;
    let mut a = started(config(PatternType::Circles, layers, 6, 1.0), options, &mut sched);
    pump(&mut a, &mut sched, 1);

    let strokes: Vec<Color> = a
        .surface()
        .ops()
        .iter()
        .filter_map(|op| match op {
            SurfaceOp::Stroke { style, .. } => Some(*style),
            _ => None,
        })
        .collect();
    let expected: Vec<Color> = (1..=layers)
        .map(|i| resolve_color(i, layers, ColorScheme::Rainbow, 1.0))
        .collect();
    assert_eq!(strokes, expected);

    let fills = a.surface().count(|op| matches!(op, SurfaceOp::Fill(c) if (c.a - 0.25).abs() < 1e-6));
    assert_eq!(fills, layers as usize);
}

#[test]
fn style_change_keeps_phase_when_applied_in_place() {
    let mut sched = CountingScheduler::default();
    let cfg = config(PatternType::Waves, 2, 6, 1.0);
    let mut a = started(cfg, RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 10);
    let phase = a.rotation().radians();

    let restyled = MandalaConfig {
        color_scheme: ColorScheme::Fire,
        ..cfg
    };
    assert!(a.apply_style(restyled));
    assert_eq!(a.config().color_scheme, ColorScheme::Fire);
    assert_eq!(a.rotation().radians(), phase);

    let regeometried = MandalaConfig { layers: 7, ..cfg };
    assert!(!a.apply_style(regeometried));
    assert_eq!(a.config().layers, 2);
}

#[test]
fn out_of_range_config_is_clamped_not_rejected() {
    let mut sched = CountingScheduler::default();
    let cfg = MandalaConfig {
        layers: 0,
        repeats_per_layer: 0,
        size: -50.0,
        rotation_speed: f64::NAN,
        ..MandalaConfig::default()
    };
    let mut a = started(cfg, RenderOptions::default(), &mut sched);
    assert_eq!(a.config().layers, 1);
    assert_eq!(a.config().repeats_per_layer, 1);
    assert_eq!(a.config().size, 1.0);
    assert_eq!(a.config().rotation_speed, 0.0);
    assert_eq!(pump(&mut a, &mut sched, 2), 2);
    assert_eq!(a.surface().count(|op| *op == SurfaceOp::BeginPath), 2);
}

#[test]
fn huge_counts_draw_one_capped_frame() {
    let mut sched = CountingScheduler::default();
    let cfg = MandalaConfig {
        pattern: PatternType::Stars,
        layers: u32::MAX,
        repeats_per_layer: 500_000_000,
        ..MandalaConfig::default()
    };
    let mut a = started(cfg, RenderOptions::default(), &mut sched);
    assert_eq!(a.config().layers, ENGINE_LAYERS_MAX);
    assert_eq!(a.config().repeats_per_layer, ENGINE_REPEATS_MAX);

    assert_eq!(pump(&mut a, &mut sched, 1), 1);
    let layers = ENGINE_LAYERS_MAX as usize;
    let per_layer = ENGINE_REPEATS_MAX as usize * 10 - 1;
    assert_eq!(a.surface().count(|op| *op == SurfaceOp::BeginPath), layers);
    assert_eq!(
        a.surface().count(|op| matches!(op, SurfaceOp::LineTo(_))),
        layers * per_layer
    );
}

#[test]
fn replacing_the_surface_keeps_the_phase() {
    let mut sched = CountingScheduler::default();
    let speed = 1.5;
    let mut a = started(config(PatternType::Petals, 2, 6, speed), RenderOptions::default(), &mut sched);
    pump(&mut a, &mut sched, 10);
    let phase = a.rotation().radians();
    let handle = a.handle();

    let old = a.replace_surface(RecordingSurface::new(60, 30)).unwrap();
    assert_eq!(old.pixel_size(), (100, 100));
    assert_eq!(a.surface().pixel_size(), (60, 30));
    assert_eq!(a.rotation().radians(), phase);
    assert_eq!(a.handle(), handle, "the pending frame carries over");
    assert_eq!(a.state(), AnimatorState::Running);
    assert_eq!(sched.canceled, 0);

    assert_eq!(pump(&mut a, &mut sched, 1), 1);
    let angle = a.surface().ops().iter().find_map(|op| match op {
        SurfaceOp::SetTransform { angle, .. } => Some(*angle),
        _ => None,
    });
    assert!((angle.unwrap() - 10.0 * speed * TIME_QUANTUM).abs() < 1e-12);
}

#[test]
fn empty_replacement_surface_is_refused() {
    let mut sched = CountingScheduler::default();
    let mut a = started(MandalaConfig::default(), RenderOptions::default(), &mut sched);
    let err = a.replace_surface(RecordingSurface::new(0, 40)).err();
    assert_eq!(err, Some(AnimatorError::SurfaceUnavailable { width: 0, height: 40 }));
    assert_eq!(a.surface().pixel_size(), (100, 100));
}

#[test]
fn frozen_animation_redraws_after_a_surface_swap() {
    let mut sched = CountingScheduler::default();
    let options = RenderOptions {
        skip_static_redraw: true,
        ..RenderOptions::default()
    };
    let mut a = started(config(PatternType::Diamonds, 2, 4, 0.0), options, &mut sched);
    pump(&mut a, &mut sched, 3);
    assert_eq!(a.frames_drawn(), 1);

    a.replace_surface(RecordingSurface::new(50, 50)).unwrap();
    pump(&mut a, &mut sched, 3);
    assert_eq!(a.frames_drawn(), 1);
    assert_eq!(a.surface().count(|op| *op == SurfaceOp::FillBackground(Color::WHITE)), 1);
}
