//! Layer composition: one concentric ring of motifs per layer.

use crate::color::{Color, resolve_color};
use crate::config::{ColorScheme, RenderOptions};
use crate::geometry::{Path, PathCommand, Point2D};
use crate::motif::{MotifRegistry, Ring};
use crate::surface::DrawSurface;

/// Outermost layers stop at this fraction of the half-size.
pub const RADIUS_FRACTION: f64 = 0.9;
pub const STROKE_WIDTH: f64 = 2.0;

/// Radius of layer `layer_index` (1-based) out of `layers` on a `size` square.
pub fn layer_radius(layer_index: u32, layers: u32, size: f64) -> f64 {
    let layers = layers.max(1);
    let index = layer_index.clamp(1, layers);
    (size / 2.0) * (f64::from(index) / f64::from(layers)) * RADIUS_FRACTION
}

/// A ready-to-paint layer: its path plus stroke and fill styles.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPaint {
    pub path: Path,
    pub stroke: Color,
    pub stroke_width: f64,
    pub fill: Color,
}

/// Describes one layer of the mandala.
pub struct LayerSpec<'a> {
    pub layer_index: u32,
    pub layers: u32,
    pub repeats: u32,
    pub size: f64,
    pub pattern: &'a str,
    pub scheme: ColorScheme,
}

pub fn compose_layer(registry: &MotifRegistry, spec: &LayerSpec<'_>, options: &RenderOptions) -> LayerPaint {
    let half = spec.size / 2.0;
    let ring = Ring::new(
        Point2D::new(half, half),
        layer_radius(spec.layer_index, spec.layers, spec.size),
        spec.repeats,
    );
    let path = registry.resolve(spec.pattern)(&ring);

    let stroke = if options.colorize {
        resolve_color(spec.layer_index, spec.layers, spec.scheme, 1.0)
    } else {
        Color::BLACK
    };
    let fill = if options.fill_alpha > 0.0 {
        resolve_color(spec.layer_index, spec.layers, spec.scheme, options.fill_alpha as f32)
    } else {
        Color::TRANSPARENT
    };

    LayerPaint {
        path,
        stroke,
        stroke_width: STROKE_WIDTH,
        fill,
    }
}

/// Replay the layer path on `surface`, close it, then stroke and fill.
pub fn paint_layer(surface: &mut dyn DrawSurface, layer: &LayerPaint) {
    surface.begin_path();
    for cmd in layer.path.commands() {
        match *cmd {
            PathCommand::MoveTo(p) => surface.move_to(p),
            PathCommand::LineTo(p) => surface.line_to(p),
            PathCommand::ArcTo {
                center,
                radius,
                start_angle,
                end_angle,
            } => surface.arc(center, radius, start_angle, end_angle),
            PathCommand::QuadCurveTo { control, end } => surface.quadratic_curve_to(control, end),
        }
    }
    surface.close_path();
    surface.stroke(layer.stroke, layer.stroke_width);
    surface.fill(layer.fill);
}
