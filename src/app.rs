use crate::animator::{AnimatorInstance, FrameQueue};
use crate::capability::probe_runtime;
use crate::config::{
    Config, ConfigChange, MandalaConfig, RenderOptions, RendererMode, LAYERS_MAX, LAYERS_MIN, REPEATS_MAX,
    REPEATS_MIN, SIZE_MAX, SIZE_MIN, SIZE_STEP, SPEED_MAX, SPEED_MIN, SPEED_STEP,
};
use crate::render::{BrailleRenderer, Frame, HalfBlockRenderer, KittyRenderer, Renderer};
use crate::surface::Canvas;
use crate::terminal::TerminalSession;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let probe = probe_runtime(cfg.renderer, cfg.auto_probe);
    for note in probe.notes() {
        log::info!("capability: {note}");
    }

    let mut term = TerminalSession::open(cfg.sync_updates, probe.renderer)?;
    let mut out = TerminalSession::writer();

    let mut renderer: Box<dyn Renderer> = match probe.renderer {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
        RendererMode::Kitty => Box::new(KittyRenderer::new()),
    };
    let cell = renderer.cell_pixels();
    let probe_label = probe.status_label();

    let options = cfg.render_options();
    let mut mandala = cfg.mandala();
    let mut scheduler = FrameQueue::new();

    let mut last_size = term.size();
    let mut show_hud = true;
    let mut show_help = false;
    let mut hud_rows = hud_rows_for_size(last_size, show_hud);
    let mut animator = start_instance(mandala, options, last_size, hud_rows, cell, &mut scheduler)?;
    let mut fps = FpsCounter::new();

    loop {
        let now = Instant::now();
        let mut edited = mandala;
        let mut relayout = false;

        // Drain input events (non-blocking).
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let quit = matches!(k.code, KeyCode::Char('q') | KeyCode::Esc)
                        || (k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL));
                    if quit {
                        animator.stop(&mut scheduler);
                        return Ok(());
                    }
                    match k.code {
                        KeyCode::Char('i') => {
                            show_hud = !show_hud;
                            relayout = true;
                        }
                        KeyCode::Char('?') | KeyCode::Char('/') | KeyCode::Char('h') | KeyCode::F(1) => {
                            show_help = !show_help;
                        }
                        code => {
                            if let Some(next) = edit_config(code, &edited) {
                                edited = next;
                            }
                        }
                    }
                }
                Event::Resize(c, r) => {
                    relayout |= term.resized((c, r));
                }
                _ => {}
            }
        }

        relayout |= term.refresh_size()?;
        last_size = term.size();

        let (term_cols, term_rows) = last_size;
        let hud = if show_hud {
            build_hud(
                term_cols as usize,
                &mandala,
                animator.rotation().radians(),
                fps.fps(),
                renderer.name(),
                &probe_label,
            )
        } else {
            String::new()
        };
        let target_hud_rows = hud_rows_for_size(last_size, show_hud);
        if target_hud_rows != hud_rows {
            hud_rows = target_hud_rows;
            relayout = true;
        }

        let change = mandala.classify_change(&edited);
        if change != ConfigChange::Unchanged {
            let restyled = change == ConfigChange::Style
                && options.keep_phase_on_style
                && animator.apply_style(edited);
            if restyled {
                log::info!("restyled to {} without restarting", edited.color_scheme.name());
            } else {
                log::info!("config changed ({change:?}); restarting animator");
                animator.stop(&mut scheduler);
                animator = start_instance(edited, options, last_size, hud_rows, cell, &mut scheduler)?;
                relayout = false;
            }
            mandala = edited;
        }
        if relayout {
            // Layout changes re-acquire the canvas but keep the rotation phase.
            let canvas = acquire_canvas(&mandala, last_size, hud_rows, cell)?;
            animator
                .replace_surface(canvas)
                .context("move animator to the resized canvas")?;
        }

        for handle in scheduler.take_due() {
            animator.on_frame(handle, &mut scheduler);
        }

        let canvas = animator.surface();
        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows: visual_rows(last_size, hud_rows),
            pixel_width: canvas.width(),
            pixel_height: canvas.height(),
            pixels_rgba: canvas.pixels(),
            hud: &hud,
            hud_rows,
            overlay: show_help.then(help_popup_text),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn acquire_canvas(
    config: &MandalaConfig,
    size: (u16, u16),
    hud_rows: u16,
    cell: (usize, usize),
) -> anyhow::Result<Canvas> {
    let (w, h) = visual_pixels(size, hud_rows, cell);
    Canvas::new(w, h, config.size).with_context(|| format!("acquire {w}x{h} drawing surface"))
}

/// Acquire a canvas sized to the visual area and start a fresh instance on it.
fn start_instance(
    config: MandalaConfig,
    options: RenderOptions,
    size: (u16, u16),
    hud_rows: u16,
    cell: (usize, usize),
    scheduler: &mut FrameQueue,
) -> anyhow::Result<AnimatorInstance<Canvas>> {
    let canvas = acquire_canvas(&config, size, hud_rows, cell)?;
    let mut animator = AnimatorInstance::new(canvas, config, options);
    animator.start(scheduler).context("start animator")?;
    Ok(animator)
}

fn visual_rows(size: (u16, u16), hud_rows: u16) -> u16 {
    size.1.saturating_sub(hud_rows).max(1)
}

pub fn visual_pixels(size: (u16, u16), hud_rows: u16, cell: (usize, usize)) -> (usize, usize) {
    let rows = visual_rows(size, hud_rows);
    (
        (size.0 as usize).saturating_mul(cell.0),
        (rows as usize).saturating_mul(cell.1),
    )
}

/// Apply one control-panel key to `cfg`. `None` means the key is not a control.
///
/// Ranges match the slider limits: layers 1-20, repeats 3-24, size 300-800
/// in steps of 50, speed 0-5 in steps of 0.1.
pub fn edit_config(code: KeyCode, cfg: &MandalaConfig) -> Option<MandalaConfig> {
    let mut next = *cfg;
    match code {
        KeyCode::Char('p') => next.pattern = cfg.pattern.next(),
        KeyCode::Char('P') => next.pattern = cfg.pattern.prev(),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            next.layers = cfg.layers.saturating_add(1).clamp(LAYERS_MIN, LAYERS_MAX)
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            next.layers = cfg.layers.saturating_sub(1).clamp(LAYERS_MIN, LAYERS_MAX)
        }
        KeyCode::Char(']') => {
            next.repeats_per_layer = cfg.repeats_per_layer.saturating_add(1).clamp(REPEATS_MIN, REPEATS_MAX)
        }
        KeyCode::Char('[') => {
            next.repeats_per_layer = cfg.repeats_per_layer.saturating_sub(1).clamp(REPEATS_MIN, REPEATS_MAX)
        }
        KeyCode::Char('>') | KeyCode::Char('.') => next.size = snap_size(cfg.size + SIZE_STEP),
        KeyCode::Char('<') | KeyCode::Char(',') => next.size = snap_size(cfg.size - SIZE_STEP),
        KeyCode::Char('c') => next.color_scheme = cfg.color_scheme.next(),
        KeyCode::Char('C') => next.color_scheme = cfg.color_scheme.prev(),
        KeyCode::Up => next.rotation_speed = snap_speed(cfg.rotation_speed + SPEED_STEP),
        KeyCode::Down => next.rotation_speed = snap_speed(cfg.rotation_speed - SPEED_STEP),
        KeyCode::Char('0') => next.rotation_speed = 0.0,
        KeyCode::Char('r') => next = MandalaConfig::randomized(),
        KeyCode::Char('d') => next = MandalaConfig::panel_defaults(),
        _ => return None,
    }
    Some(next)
}

fn snap_size(size: f64) -> f64 {
    let steps = ((size - SIZE_MIN) / SIZE_STEP).round();
    (SIZE_MIN + steps * SIZE_STEP).clamp(SIZE_MIN, SIZE_MAX)
}

fn snap_speed(speed: f64) -> f64 {
    ((speed * 10.0).round() / 10.0).clamp(SPEED_MIN, SPEED_MAX)
}

/// HUD height depends on the terminal size only, never on the HUD text.
fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud || size.1 <= 1 {
        return 0;
    }
    (size.1 - 1).min(2)
}

pub fn build_hud(
    cols: usize,
    cfg: &MandalaConfig,
    rotation: f64,
    fps: f32,
    renderer_name: &str,
    probe_label: &str,
) -> String {
    let logical_lines = [
        format!(
            "Pattern: {} | Layers: {} | Repeats: {} | Size: {} | Scheme: {} | Speed: {:.1} | Rot: {:>6.3} rad | FPS: {:>4.1} | Renderer: {} ({})",
            cfg.pattern.name(),
            cfg.layers,
            cfg.repeats_per_layer,
            cfg.size,
            cfg.color_scheme.name(),
            cfg.rotation_speed,
            rotation,
            fps,
            renderer_name,
            probe_label,
        ),
        "Keys: p/P pattern | +/- layers | [/] repeats | </> size | c/C scheme | up/down speed | 0 freeze | r random | d defaults | i HUD | ? help | q quit".to_string(),
    ];
    logical_lines
        .iter()
        .flat_map(|line| hard_wrap_line(line, cols.max(1)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn hard_wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

pub fn help_popup_text() -> &'static str {
    "Mandala Controls\n\
p / P  next / previous pattern (circles, petals, stars, diamonds, waves)\n\
+ / -  more / fewer layers (1-20)\n\
] / [  more / fewer repeats per layer (3-24)\n\
> / <  larger / smaller canvas (300-800)\n\
c / C  next / previous color scheme\n\
up/down  rotation speed (0-5)\n\
0  freeze rotation\n\
r  randomize everything\n\
d  reset to defaults (petals, 8 layers, 12 repeats, 600, rainbow, speed 1)\n\
i  show/hide HUD\n\
? or / or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
