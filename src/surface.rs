//! Drawing surfaces.
//!
//! [`DrawSurface`] is the immediate-mode capability set the animator draws
//! through. [`Canvas`] rasterizes into an RGBA8 pixmap for the terminal
//! presenters; [`RecordingSurface`] keeps a log of calls for tests.

use crate::color::Color;
use crate::geometry::Point2D;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use tiny_skia::{BlendMode, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

pub trait DrawSurface {
    /// Backing pixel dimensions. A zero extent means nothing can be drawn.
    fn pixel_size(&self) -> (usize, usize);
    fn clear(&mut self, width: f64, height: f64);
    fn fill_background(&mut self, color: Color);
    /// Rotate subsequent drawing by `angle` radians about `pivot`.
    fn set_transform(&mut self, pivot: Point2D, angle: f64);
    fn reset_transform(&mut self);
    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point2D);
    fn line_to(&mut self, p: Point2D);
    fn arc(&mut self, center: Point2D, radius: f64, start_angle: f64, end_angle: f64);
    fn quadratic_curve_to(&mut self, control: Point2D, end: Point2D);
    fn close_path(&mut self);
    fn stroke(&mut self, style: Color, width: f64);
    fn fill(&mut self, style: Color);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Empty { width: usize, height: usize },
    TooLarge { width: usize, height: usize },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { width, height } => {
                write!(f, "drawing surface has no area ({width}x{height})")
            }
            Self::TooLarge { width, height } => write!(
                f,
                "drawing surface {width}x{height} exceeds {MAX_PIXELS} pixels"
            ),
        }
    }
}

impl std::error::Error for SurfaceError {}

pub const MAX_PIXELS: usize = 4096 * 4096;

/// RGBA8 canvas rasterized by `tiny_skia`.
///
/// The logical `logical_size` square is scaled uniformly to fit the pixmap
/// and centered in it. Points are mapped to device space when they are
/// added, so a transform change mid-path only affects later points.
pub struct Canvas {
    pixmap: Pixmap,
    logical_size: f64,
    scale: f64,
    offset: (f64, f64),
    rotation: Option<(Point2D, f64)>,
    path: PathBuilder,
    pen: Option<Point2D>,
    subpath_start: Option<Point2D>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, logical_size: f64) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Empty { width, height });
        }
        if width.saturating_mul(height) > MAX_PIXELS {
            return Err(SurfaceError::TooLarge { width, height });
        }
        let pixmap = u32::try_from(width)
            .ok()
            .zip(u32::try_from(height).ok())
            .and_then(|(w, h)| Pixmap::new(w, h))
            .ok_or(SurfaceError::TooLarge { width, height })?;

        let logical_size = if logical_size.is_finite() {
            logical_size.max(1.0)
        } else {
            1.0
        };
        let scale = (width.min(height) as f64) / logical_size;
        let offset = (
            (width as f64 - logical_size * scale) / 2.0,
            (height as f64 - logical_size * scale) / 2.0,
        );
        Ok(Self {
            pixmap,
            logical_size,
            scale,
            offset,
            rotation: None,
            path: PathBuilder::new(),
            pen: None,
            subpath_start: None,
        })
    }

    pub fn width(&self) -> usize {
        self.pixmap.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixmap.height() as usize
    }

    pub fn logical_size(&self) -> f64 {
        self.logical_size
    }

    /// Device pixels per logical unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Row-major RGBA8, premultiplied. Frames drawn on an opaque background
    /// are fully opaque, so this is plain RGBA for the presenters.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.pixmap.pixel(x, y)?;
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    /// Logical point to device coordinates, after the current rotation.
    pub fn to_device(&self, p: Point2D) -> (f64, f64) {
        let p = match self.rotation {
            Some((pivot, angle)) => p.rotated_about(pivot, angle),
            None => p,
        };
        (
            p.x * self.scale + self.offset.0,
            p.y * self.scale + self.offset.1,
        )
    }

    fn device(&self, p: Point2D) -> (f32, f32) {
        let (x, y) = self.to_device(p);
        (x as f32, y as f32)
    }

    fn start_subpath(&mut self, p: Point2D) {
        let (x, y) = self.device(p);
        self.path.move_to(x, y);
        self.pen = Some(p);
        self.subpath_start = Some(p);
    }

    /// The current path, or `None` when it has nothing drawable.
    fn finished_path(&self) -> Option<tiny_skia::Path> {
        self.path.clone().finish()
    }
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    let alpha = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    paint.set_color_rgba8(color.r, color.g, color.b, alpha);
    paint.anti_alias = true;
    paint
}

impl DrawSurface for Canvas {
    fn pixel_size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    fn clear(&mut self, width: f64, height: f64) {
        let x0 = self.offset.0.max(0.0).round();
        let y0 = self.offset.1.max(0.0).round();
        let x1 = (self.offset.0 + width.max(0.0) * self.scale)
            .min(self.width() as f64)
            .round();
        let y1 = (self.offset.1 + height.max(0.0) * self.scale)
            .min(self.height() as f64)
            .round();
        let Some(rect) = Rect::from_ltrb(x0 as f32, y0 as f32, x1 as f32, y1 as f32) else {
            return;
        };
        let mut paint = Paint::default();
        paint.blend_mode = BlendMode::Clear;
        paint.anti_alias = false;
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn fill_background(&mut self, color: Color) {
        let alpha = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, alpha));
    }

    fn set_transform(&mut self, pivot: Point2D, angle: f64) {
        self.rotation = if angle.is_finite() {
            Some((pivot, angle))
        } else {
            None
        };
    }

    fn reset_transform(&mut self) {
        self.rotation = None;
    }

    fn begin_path(&mut self) {
        self.path = PathBuilder::new();
        self.pen = None;
        self.subpath_start = None;
    }

    fn move_to(&mut self, p: Point2D) {
        self.start_subpath(p);
    }

    fn line_to(&mut self, p: Point2D) {
        if self.pen.is_none() {
            self.start_subpath(p);
            return;
        }
        let (x, y) = self.device(p);
        self.path.line_to(x, y);
        self.pen = Some(p);
    }

    /// Clockwise arc, joined to the pen by a straight line. Each quarter
    /// turn or less becomes one cubic.
    fn arc(&mut self, center: Point2D, radius: f64, start_angle: f64, end_angle: f64) {
        let radius = radius.max(0.0);
        let mut sweep = end_angle - start_angle;
        if sweep < 0.0 {
            sweep = sweep.rem_euclid(TAU);
        }
        let sweep = sweep.min(TAU);

        self.line_to(center.polar(radius, start_angle));
        if radius == 0.0 || sweep <= 0.0 {
            return;
        }

        let segments = (sweep / FRAC_PI_2).ceil().max(1.0);
        let step = sweep / segments;
        let handle = 4.0 / 3.0 * (step / 4.0).tan() * radius;
        let mut a0 = start_angle;
        for _ in 0..segments as usize {
            let a1 = a0 + step;
            let from = center.polar(radius, a0);
            let to = center.polar(radius, a1);
            let c1 = Point2D::new(from.x - handle * a0.sin(), from.y + handle * a0.cos());
            let c2 = Point2D::new(to.x + handle * a1.sin(), to.y - handle * a1.cos());
            let ((x1, y1), (x2, y2), (x, y)) = (self.device(c1), self.device(c2), self.device(to));
            self.path.cubic_to(x1, y1, x2, y2, x, y);
            self.pen = Some(to);
            a0 = a1;
        }
    }

    fn quadratic_curve_to(&mut self, control: Point2D, end: Point2D) {
        if self.pen.is_none() {
            self.start_subpath(control);
        }
        let ((cx, cy), (x, y)) = (self.device(control), self.device(end));
        self.path.quad_to(cx, cy, x, y);
        self.pen = Some(end);
    }

    fn close_path(&mut self) {
        if self.subpath_start.is_none() {
            return;
        }
        self.path.close();
        self.pen = self.subpath_start;
    }

    /// Strokes are at least one device pixel wide.
    fn stroke(&mut self, style: Color, width: f64) {
        if style.is_transparent() {
            return;
        }
        let Some(path) = self.finished_path() else {
            return;
        };
        let stroke = Stroke {
            width: (width * self.scale).max(1.0) as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint_for(style), &stroke, Transform::identity(), None);
    }

    fn fill(&mut self, style: Color) {
        if style.is_transparent() {
            return;
        }
        let Some(path) = self.finished_path() else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint_for(style),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

/// One recorded [`DrawSurface`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear { width: f64, height: f64 },
    FillBackground(Color),
    SetTransform { pivot: Point2D, angle: f64 },
    ResetTransform,
    BeginPath,
    MoveTo(Point2D),
    LineTo(Point2D),
    Arc {
        center: Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    QuadraticCurveTo { control: Point2D, end: Point2D },
    ClosePath,
    Stroke { style: Color, width: f64 },
    Fill(Color),
}

/// Surface that draws nothing and remembers every call.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: (usize, usize),
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            size: (width, height),
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn count(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl DrawSurface for RecordingSurface {
    fn pixel_size(&self) -> (usize, usize) {
        self.size
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.ops.push(SurfaceOp::Clear { width, height });
    }

    fn fill_background(&mut self, color: Color) {
        self.ops.push(SurfaceOp::FillBackground(color));
    }

    fn set_transform(&mut self, pivot: Point2D, angle: f64) {
        self.ops.push(SurfaceOp::SetTransform { pivot, angle });
    }

    fn reset_transform(&mut self) {
        self.ops.push(SurfaceOp::ResetTransform);
    }

    fn begin_path(&mut self) {
        self.ops.push(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, p: Point2D) {
        self.ops.push(SurfaceOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point2D) {
        self.ops.push(SurfaceOp::LineTo(p));
    }

    fn arc(&mut self, center: Point2D, radius: f64, start_angle: f64, end_angle: f64) {
        self.ops.push(SurfaceOp::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn quadratic_curve_to(&mut self, control: Point2D, end: Point2D) {
        self.ops.push(SurfaceOp::QuadraticCurveTo { control, end });
    }

    fn close_path(&mut self) {
        self.ops.push(SurfaceOp::ClosePath);
    }

    fn stroke(&mut self, style: Color, width: f64) {
        self.ops.push(SurfaceOp::Stroke { style, width });
    }

    fn fill(&mut self, style: Color) {
        self.ops.push(SurfaceOp::Fill(style));
    }
}
