use clap::{Parser, ValueEnum};

pub const LAYERS_MIN: u32 = 1;
pub const LAYERS_MAX: u32 = 20;
pub const REPEATS_MIN: u32 = 3;
pub const REPEATS_MAX: u32 = 24;
pub const SIZE_MIN: f64 = 300.0;
pub const SIZE_MAX: f64 = 800.0;
pub const SIZE_STEP: f64 = 50.0;
pub const SPEED_MIN: f64 = 0.0;
pub const SPEED_MAX: f64 = 5.0;
pub const SPEED_STEP: f64 = 0.1;

/// Hard engine ceilings. CLI values above these are clamped, not rejected.
pub const ENGINE_LAYERS_MAX: u32 = 64;
pub const ENGINE_REPEATS_MAX: u32 = 720;
pub const ENGINE_SIZE_MAX: f64 = 100_000.0;

const DEFAULT_SIZE: f64 = 600.0;

#[derive(Parser, Debug, Clone)]
#[command(name = "mandala-tui", version, about = "Animated radial mandala patterns in the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = PatternType::Petals)]
    pub pattern: PatternType,

    #[arg(long, default_value_t = 8)]
    pub layers: u32,

    #[arg(long, default_value_t = 12)]
    pub repeats: u32,

    /// Edge length of the logical drawing square.
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    pub size: f64,

    #[arg(long, value_enum, default_value_t = ColorScheme::Monochrome)]
    pub color_scheme: ColorScheme,

    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub rotation_speed: f64,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Stroke each layer with the color scheme instead of black.
    #[arg(long, default_value_t = false)]
    pub colorize: bool,

    /// Fill each layer with its scheme color at this alpha (0 disables fills).
    #[arg(long, default_value_t = 0.0)]
    pub fill_alpha: f64,

    /// Keep the rotation phase when only the color scheme changes.
    #[arg(long, default_value_t = false)]
    pub keep_phase_on_style: bool,

    /// Skip redrawing while the rotation speed is zero.
    #[arg(long, default_value_t = false)]
    pub skip_static_redraw: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_probe: bool,
}

impl Config {
    pub fn mandala(&self) -> MandalaConfig {
        MandalaConfig {
            pattern: self.pattern,
            layers: self.layers,
            repeats_per_layer: self.repeats,
            size: self.size,
            color_scheme: self.color_scheme,
            rotation_speed: self.rotation_speed,
        }
        .sanitized()
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            colorize: self.colorize,
            fill_alpha: if self.fill_alpha.is_finite() {
                self.fill_alpha.clamp(0.0, 1.0)
            } else {
                0.0
            },
            keep_phase_on_style: self.keep_phase_on_style,
            skip_static_redraw: self.skip_static_redraw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
    Kitty,
}

impl RendererMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::HalfBlock => "half-block",
            Self::Braille => "braille",
            Self::Kitty => "kitty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum PatternType {
    Circles,
    Petals,
    Stars,
    Diamonds,
    Waves,
}

impl PatternType {
    pub const fn all() -> [Self; 5] {
        [
            Self::Circles,
            Self::Petals,
            Self::Stars,
            Self::Diamonds,
            Self::Waves,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Circles => "circles",
            Self::Petals => "petals",
            Self::Stars => "stars",
            Self::Diamonds => "diamonds",
            Self::Waves => "waves",
        }
    }

    /// Unknown names fall back to circles.
    pub fn parse_or_default(raw: &str) -> Self {
        let token = raw.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|p| p.name() == token)
            .unwrap_or(Self::Circles)
    }

    pub fn next(self) -> Self {
        cycle(&Self::all(), self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::all(), self, Self::all().len() - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ColorScheme {
    Rainbow,
    Ocean,
    Fire,
    Purple,
    Monochrome,
}

impl ColorScheme {
    pub const fn all() -> [Self; 5] {
        [
            Self::Rainbow,
            Self::Ocean,
            Self::Fire,
            Self::Purple,
            Self::Monochrome,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rainbow => "rainbow",
            Self::Ocean => "ocean",
            Self::Fire => "fire",
            Self::Purple => "purple",
            Self::Monochrome => "monochrome",
        }
    }

    /// Unknown names fall back to rainbow.
    pub fn parse_or_default(raw: &str) -> Self {
        let token = raw.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|s| s.name() == token)
            .unwrap_or(Self::Rainbow)
    }

    pub fn next(self) -> Self {
        cycle(&Self::all(), self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::all(), self, Self::all().len() - 1)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], cur: T, step: usize) -> T {
    let idx = all.iter().position(|v| *v == cur).unwrap_or(0);
    all[(idx + step) % all.len()]
}

/// Immutable snapshot of everything that shapes one render cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MandalaConfig {
    pub pattern: PatternType,
    pub layers: u32,
    pub repeats_per_layer: u32,
    pub size: f64,
    pub color_scheme: ColorScheme,
    pub rotation_speed: f64,
}

impl Default for MandalaConfig {
    fn default() -> Self {
        Self {
            pattern: PatternType::Petals,
            layers: 8,
            repeats_per_layer: 12,
            size: DEFAULT_SIZE,
            color_scheme: ColorScheme::Monochrome,
            rotation_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    Unchanged,
    /// Only fields that never touch geometry changed.
    Style,
    Geometry,
}

impl MandalaConfig {
    /// Values the control panel's reset button restores. The scheme is
    /// rainbow here even though the first launch starts monochrome.
    pub fn panel_defaults() -> Self {
        Self {
            color_scheme: ColorScheme::Rainbow,
            ..Self::default()
        }
    }

    /// Clamp to values the engine can always draw. Never fails.
    ///
    /// Layers and repeats land in `1..=ENGINE_*_MAX`, size in
    /// `1.0..=ENGINE_SIZE_MAX`.
    pub fn sanitized(mut self) -> Self {
        self.layers = self.layers.clamp(1, ENGINE_LAYERS_MAX);
        self.repeats_per_layer = self.repeats_per_layer.clamp(1, ENGINE_REPEATS_MAX);
        self.size = if self.size.is_finite() {
            self.size.clamp(1.0, ENGINE_SIZE_MAX)
        } else {
            DEFAULT_SIZE
        };
        if !self.rotation_speed.is_finite() {
            self.rotation_speed = 0.0;
        }
        self
    }

    pub fn center(&self) -> f64 {
        self.size / 2.0
    }

    pub fn classify_change(&self, new: &Self) -> ConfigChange {
        let geometry_same = self.pattern == new.pattern
            && self.layers == new.layers
            && self.repeats_per_layer == new.repeats_per_layer
            && self.size == new.size
            && self.rotation_speed == new.rotation_speed;
        if !geometry_same {
            ConfigChange::Geometry
        } else if self.color_scheme != new.color_scheme {
            ConfigChange::Style
        } else {
            ConfigChange::Unchanged
        }
    }

    pub fn randomized() -> Self {
        let patterns = PatternType::all();
        let schemes = ColorScheme::all();
        let size_steps = ((SIZE_MAX - SIZE_MIN) / SIZE_STEP) as u32;
        Self {
            pattern: patterns[fastrand::usize(..patterns.len())],
            layers: fastrand::u32(LAYERS_MIN..=LAYERS_MAX),
            repeats_per_layer: fastrand::u32(REPEATS_MIN..=REPEATS_MAX),
            size: SIZE_MIN + f64::from(fastrand::u32(0..=size_steps)) * SIZE_STEP,
            color_scheme: schemes[fastrand::usize(..schemes.len())],
            rotation_speed: (fastrand::f64() * SPEED_MAX * 10.0).round() / 10.0,
        }
    }
}

/// Render-path switches. Every default reproduces the reference output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderOptions {
    pub colorize: bool,
    pub fill_alpha: f64,
    pub keep_phase_on_style: bool,
    pub skip_static_redraw: bool,
}
