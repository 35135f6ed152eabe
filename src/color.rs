//! Layer color palettes.

use crate::config::ColorScheme;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in 0..=1.
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 },
            ..self
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

const RAINBOW: [Color; 6] = [
    Color::rgb(255, 0, 0),
    Color::rgb(255, 165, 0),
    Color::rgb(255, 255, 0),
    Color::rgb(0, 255, 0),
    Color::rgb(0, 127, 255),
    Color::rgb(139, 0, 255),
];

const OCEAN: [Color; 5] = [
    Color::rgb(0, 105, 148),
    Color::rgb(0, 150, 199),
    Color::rgb(0, 180, 216),
    Color::rgb(72, 202, 228),
    Color::rgb(144, 224, 239),
];

const FIRE: [Color; 5] = [
    Color::rgb(255, 0, 0),
    Color::rgb(255, 69, 0),
    Color::rgb(255, 140, 0),
    Color::rgb(255, 215, 0),
    Color::rgb(255, 255, 0),
];

const PURPLE: [Color; 5] = [
    Color::rgb(75, 0, 130),
    Color::rgb(123, 31, 162),
    Color::rgb(171, 71, 188),
    Color::rgb(206, 147, 216),
    Color::rgb(225, 190, 231),
];

const MONOCHROME: [Color; 5] = [
    Color::rgb(255, 255, 255),
    Color::rgb(200, 200, 200),
    Color::rgb(150, 150, 150),
    Color::rgb(100, 100, 100),
    Color::rgb(50, 50, 50),
];

pub fn palette(scheme: ColorScheme) -> &'static [Color] {
    match scheme {
        ColorScheme::Rainbow => &RAINBOW,
        ColorScheme::Ocean => &OCEAN,
        ColorScheme::Fire => &FIRE,
        ColorScheme::Purple => &PURPLE,
        ColorScheme::Monochrome => &MONOCHROME,
    }
}

/// Color for layer `layer_index` (1-based) of `total_layers`.
///
/// The palette slot is `floor(layer_index / total_layers * (N - 1))`, so the
/// outermost layer lands on the last entry. Out-of-range inputs are clamped.
pub fn resolve_color(layer_index: u32, total_layers: u32, scheme: ColorScheme, alpha: f32) -> Color {
    let colors = palette(scheme);
    let total = total_layers.max(1);
    let ratio = f64::from(layer_index.min(total)) / f64::from(total);
    let last = colors.len() - 1;
    let idx = ((ratio * last as f64).floor() as usize).min(last);
    colors[idx].with_alpha(alpha)
}

pub fn resolve_color_named(layer_index: u32, total_layers: u32, scheme: &str, alpha: f32) -> Color {
    resolve_color(layer_index, total_layers, ColorScheme::parse_or_default(scheme), alpha)
}
