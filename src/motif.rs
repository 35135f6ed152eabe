//! Motif generators.
//!
//! Each generator traces `repeats` copies of one motif around a ring as a
//! single continuous [`Path`]. Motif 0 is anchored at 12 o'clock and the rest
//! follow clockwise, one `angle_step` apart.

use crate::config::ENGINE_REPEATS_MAX;
use crate::geometry::{Path, Point2D, Vector2};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Placement of one layer's motifs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub center: Point2D,
    pub radius: f64,
    pub repeats: u32,
}

impl Ring {
    pub fn new(center: Point2D, radius: f64, repeats: u32) -> Self {
        Self {
            center,
            radius,
            repeats: repeats.clamp(1, ENGINE_REPEATS_MAX),
        }
    }

    /// Motifs actually traced. Rings built as literals are clamped here too.
    pub fn count(&self) -> u32 {
        self.repeats.clamp(1, ENGINE_REPEATS_MAX)
    }

    pub fn angle_step(&self) -> f64 {
        TAU / f64::from(self.count())
    }

    /// Base angle of motif `i`, measured clockwise from 12 o'clock.
    pub fn angle(&self, i: u32) -> f64 {
        f64::from(i) * self.angle_step()
    }

    pub fn anchor(&self, i: u32) -> Point2D {
        self.center.polar(self.radius, self.angle(i) - FRAC_PI_2)
    }
}

pub type MotifFn = fn(&Ring) -> Path;

/// Scalloped ring: one arc per anchor, each sweeping one `angle_step`.
///
/// Runs `repeats + 1` arcs so the last scallop overlaps the first and the
/// ring closes without a visible notch.
pub fn circles(ring: &Ring) -> Path {
    let r = ring.radius * 0.15;
    let step = ring.angle_step();
    let n = ring.count();
    let mut path = Path::with_capacity(capacity(n, 1, 2));
    for i in 0..=n {
        let anchor = ring.anchor(i);
        if i == 0 {
            path.move_to(Point2D::new(anchor.x + r, anchor.y));
        }
        let start = f64::from(i) * step;
        path.arc_to(anchor, r, start, start + step);
    }
    path
}

pub fn petals(ring: &Ring) -> Path {
    let width = ring.radius * 0.15;
    let length = ring.radius * 0.3;
    let n = ring.count();
    let mut path = Path::with_capacity(capacity(n, 2, 1));
    for i in 0..n {
        let anchor = ring.anchor(i);
        let across = Vector2::from_angle(ring.angle(i));
        if i == 0 {
            path.move_to(anchor.offset(across, -length));
        }
        path.quad_to(anchor.offset(across, width), anchor.offset(across, length));
        path.quad_to(anchor.offset(across, -width), anchor.offset(across, -length));
    }
    path
}

pub fn stars(ring: &Ring) -> Path {
    const POINTS: u32 = 5;
    let outer = ring.radius * 0.25;
    let inner = ring.radius * 0.12;
    let n = ring.count();
    let mut path = Path::with_capacity(capacity(n, POINTS as usize * 2, 0));
    for i in 0..n {
        let base = ring.angle(i);
        let anchor = ring.anchor(i);
        for p in 0..POINTS * 2 {
            let angle = base + f64::from(p) * PI / f64::from(POINTS);
            let r = if p % 2 == 0 { outer } else { inner };
            let pt = anchor.polar(r, angle - FRAC_PI_2);
            if i == 0 && p == 0 {
                path.move_to(pt);
            } else {
                path.line_to(pt);
            }
        }
    }
    path
}

pub fn diamonds(ring: &Ring) -> Path {
    let half = ring.radius * 0.25;
    let narrow = half * 0.6;
    let n = ring.count();
    let mut path = Path::with_capacity(capacity(n, 4, 1));
    for i in 0..n {
        let angle = ring.angle(i);
        let anchor = ring.anchor(i);
        let across = Vector2::from_angle(angle);
        let inward = Vector2::normal(angle);
        if i == 0 {
            path.move_to(anchor.offset(across, -half));
        }
        path.line_to(anchor.offset(inward, narrow));
        path.line_to(anchor.offset(across, half));
        path.line_to(anchor.offset(inward, -narrow));
        path.line_to(anchor.offset(across, -half));
    }
    path
}

/// S-shaped bumps; the return curve swings 1.5x further outward.
pub fn waves(ring: &Ring) -> Path {
    let width = ring.radius * 0.2;
    let height = ring.radius * 0.15;
    let n = ring.count();
    let mut path = Path::with_capacity(capacity(n, 2, 3));
    for i in 0..=n {
        let angle = ring.angle(i) - FRAC_PI_2;
        let anchor = ring.anchor(i);
        let tangent = Vector2::normal(angle);
        let outward = Vector2::from_angle(angle);

        if i == 0 {
            path.move_to(anchor.offset(tangent, -width).offset(outward, height));
        }
        path.quad_to(
            anchor.offset(tangent, -width * 0.5).offset(outward, -height),
            anchor.offset(outward, height),
        );
        path.quad_to(
            anchor.offset(tangent, width * 0.5).offset(outward, height * 1.5),
            anchor.offset(tangent, width).offset(outward, height),
        );
    }
    path
}

fn capacity(repeats: u32, per_motif: usize, extra: usize) -> usize {
    (repeats as usize)
        .saturating_mul(per_motif)
        .saturating_add(extra)
}

pub const FALLBACK_MOTIF: &str = "circles";

/// Name-to-generator table. New motifs are added with [`MotifRegistry::register`].
#[derive(Clone)]
pub struct MotifRegistry {
    motifs: BTreeMap<String, MotifFn>,
}

impl MotifRegistry {
    pub fn empty() -> Self {
        Self {
            motifs: BTreeMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut reg = Self::empty();
        reg.register("circles", circles);
        reg.register("petals", petals);
        reg.register("stars", stars);
        reg.register("diamonds", diamonds);
        reg.register("waves", waves);
        reg
    }

    /// Returns the generator previously bound to `name`, if any.
    pub fn register(&mut self, name: &str, motif: MotifFn) -> Option<MotifFn> {
        self.motifs.insert(normalize(name), motif)
    }

    pub fn get(&self, name: &str) -> Option<MotifFn> {
        self.motifs.get(&normalize(name)).copied()
    }

    /// Generator for `name`, or circles when the name is unknown.
    pub fn resolve(&self, name: &str) -> MotifFn {
        self.get(name)
            .or_else(|| self.get(FALLBACK_MOTIF))
            .unwrap_or(circles)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.motifs.keys().map(String::as_str)
    }
}

impl Default for MotifRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
