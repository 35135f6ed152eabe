//! Path primitives shared by the motif generators and drawing surfaces.
//!
//! Coordinates are surface units with the origin at the top-left and y
//! pointing down, so increasing angles sweep clockwise on screen.

use std::f64::consts::FRAC_PI_2;

/// Distance below which two path points count as the same point.
pub const JOIN_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `distance` from `self` in direction `angle` (radians).
    pub fn polar(self, distance: f64, angle: f64) -> Self {
        Self::new(self.x + distance * angle.cos(), self.y + distance * angle.sin())
    }

    pub fn offset(self, dir: Vector2, scale: f64) -> Self {
        Self::new(self.x + dir.x * scale, self.y + dir.y * scale)
    }

    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rotate about `pivot` by `angle` radians.
    pub fn rotated_about(self, pivot: Self, angle: f64) -> Self {
        if angle == 0.0 {
            return self;
        }
        let (s, c) = angle.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Self::new(pivot.x + dx * c - dy * s, pivot.y + dx * s + dy * c)
    }
}

/// Unit direction used to offset motif points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn from_angle(angle: f64) -> Self {
        let (y, x) = angle.sin_cos();
        Self { x, y }
    }

    /// `from_angle(angle)` turned a quarter clockwise.
    pub fn normal(angle: f64) -> Self {
        Self::from_angle(angle + FRAC_PI_2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2D),
    LineTo(Point2D),
    /// Clockwise arc from `start_angle` to `end_angle`. When the pen is not at
    /// the arc's start point, a straight join to it is part of the command.
    ArcTo {
        center: Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    QuadCurveTo { control: Point2D, end: Point2D },
}

impl PathCommand {
    pub fn end_point(&self) -> Point2D {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => p,
            Self::ArcTo {
                center,
                radius,
                end_angle,
                ..
            } => center.polar(radius, end_angle),
            Self::QuadCurveTo { end, .. } => end,
        }
    }

    /// Where the drawn geometry of this command begins, if it is not the pen.
    pub fn entry_point(&self) -> Option<Point2D> {
        match *self {
            Self::ArcTo {
                center,
                radius,
                start_angle,
                ..
            } => Some(center.polar(radius, start_angle)),
            Self::MoveTo(p) => Some(p),
            Self::LineTo(_) | Self::QuadCurveTo { .. } => None,
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => p.is_finite(),
            Self::ArcTo {
                center,
                radius,
                start_angle,
                end_angle,
            } => center.is_finite() && radius.is_finite() && start_angle.is_finite() && end_angle.is_finite(),
            Self::QuadCurveTo { control, end } => control.is_finite() && end.is_finite(),
        }
    }
}

/// One continuous stroke: a leading `MoveTo` followed by connected commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            commands: Vec::with_capacity(n),
        }
    }

    pub fn move_to(&mut self, p: Point2D) {
        self.commands.push(PathCommand::MoveTo(p));
    }

    pub fn line_to(&mut self, p: Point2D) {
        self.commands.push(PathCommand::LineTo(p));
    }

    pub fn arc_to(&mut self, center: Point2D, radius: f64, start_angle: f64, end_angle: f64) {
        self.commands.push(PathCommand::ArcTo {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    pub fn quad_to(&mut self, control: Point2D, end: Point2D) {
        self.commands.push(PathCommand::QuadCurveTo { control, end });
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn first_point(&self) -> Option<Point2D> {
        self.commands.first().map(PathCommand::end_point)
    }

    pub fn end_point(&self) -> Option<Point2D> {
        self.commands.last().map(PathCommand::end_point)
    }

    pub fn move_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    pub fn arc_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::ArcTo { .. }))
            .count()
    }

    /// One leading `MoveTo`, finite geometry, and every command starting
    /// where the previous one ended.
    pub fn is_continuous(&self) -> bool {
        self.is_continuous_within(JOIN_EPSILON)
    }

    /// Like [`Path::is_continuous`], but an arc may start up to `arc_join`
    /// away from the pen. Surfaces bridge that gap with a straight line.
    pub fn is_continuous_within(&self, arc_join: f64) -> bool {
        let mut commands = self.commands.iter();
        let mut pen = match commands.next() {
            Some(PathCommand::MoveTo(p)) if p.is_finite() => *p,
            _ => return false,
        };
        let arc_limit = arc_join.max(0.0) + JOIN_EPSILON;
        for cmd in commands {
            if !cmd.is_finite() {
                return false;
            }
            let within = match cmd {
                PathCommand::MoveTo(_) => false,
                PathCommand::ArcTo { .. } => cmd
                    .entry_point()
                    .is_some_and(|entry| pen.distance(entry) <= arc_limit),
                PathCommand::LineTo(_) | PathCommand::QuadCurveTo { .. } => true,
            };
            if !within {
                return false;
            }
            pen = cmd.end_point();
        }
        true
    }

    /// Largest straight join an arc needs to reach its entry point.
    pub fn max_arc_join(&self) -> f64 {
        let mut pen: Option<Point2D> = None;
        let mut worst = 0.0f64;
        for cmd in &self.commands {
            if let (PathCommand::ArcTo { .. }, Some(at), Some(entry)) = (cmd, pen, cmd.entry_point()) {
                worst = worst.max(at.distance(entry));
            }
            pen = Some(cmd.end_point());
        }
        worst
    }
}
