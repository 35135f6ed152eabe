//! Frame loop that spins the mandala.
//!
//! The host owns a [`FrameScheduler`]; an [`AnimatorInstance`] asks it for one
//! frame at a time and re-requests from inside each tick. Stopping cancels the
//! pending request, and ticks carrying a handle the instance no longer owns
//! are ignored.

use crate::color::Color;
use crate::config::{MandalaConfig, RenderOptions};
use crate::geometry::Point2D;
use crate::layer::{LayerSpec, compose_layer, paint_layer};
use crate::motif::MotifRegistry;
use crate::surface::DrawSurface;
use std::fmt;

/// Speed units to radians per frame.
pub const TIME_QUANTUM: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait FrameScheduler {
    fn request_frame(&mut self) -> AnimationHandle;
    fn cancel_frame(&mut self, handle: AnimationHandle);
}

/// Host-side scheduler: requests wait until the next paced loop iteration
/// drains them with [`FrameQueue::take_due`].
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Vec<AnimationHandle>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_due(&mut self) -> Vec<AnimationHandle> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> AnimationHandle {
        self.next_id += 1;
        let handle = AnimationHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: AnimationHandle) {
        self.pending.retain(|h| *h != handle);
    }
}

/// Accumulated rotation in radians. Starts at zero with every instance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    radians: f64,
}

impl RotationState {
    pub fn radians(&self) -> f64 {
        self.radians
    }

    pub fn advance(&mut self, speed: f64) {
        self.radians += speed * TIME_QUANTUM;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimatorError {
    SurfaceUnavailable { width: usize, height: usize },
    /// Stopped instances cannot restart; create a new one.
    Stopped,
}

impl fmt::Display for AnimatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceUnavailable { width, height } => {
                write!(f, "no drawing surface available ({width}x{height})")
            }
            Self::Stopped => write!(f, "animator already stopped"),
        }
    }
}

impl std::error::Error for AnimatorError {}

pub struct AnimatorInstance<S> {
    surface: S,
    config: MandalaConfig,
    options: RenderOptions,
    registry: MotifRegistry,
    rotation: RotationState,
    handle: Option<AnimationHandle>,
    state: AnimatorState,
    frames_drawn: u64,
    ticks: u64,
}

impl<S: DrawSurface> AnimatorInstance<S> {
    pub fn new(surface: S, config: MandalaConfig, options: RenderOptions) -> Self {
        Self::with_registry(surface, config, options, MotifRegistry::with_builtin())
    }

    pub fn with_registry(
        surface: S,
        config: MandalaConfig,
        options: RenderOptions,
        registry: MotifRegistry,
    ) -> Self {
        Self {
            surface,
            config: config.sanitized(),
            options,
            registry,
            rotation: RotationState::default(),
            handle: None,
            state: AnimatorState::Idle,
            frames_drawn: 0,
            ticks: 0,
        }
    }

    /// Reset rotation and schedule the first frame.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> Result<(), AnimatorError> {
        match self.state {
            AnimatorState::Stopped => return Err(AnimatorError::Stopped),
            AnimatorState::Running => return Ok(()),
            AnimatorState::Idle => {}
        }
        let (width, height) = self.surface.pixel_size();
        if width == 0 || height == 0 {
            log::error!("animator not started: surface is {width}x{height}");
            return Err(AnimatorError::SurfaceUnavailable { width, height });
        }

        self.rotation = RotationState::default();
        self.handle = Some(scheduler.request_frame());
        self.state = AnimatorState::Running;
        log::debug!(
            "animator started: {} x{} layers, {} repeats, size {}",
            self.config.pattern.name(),
            self.config.layers,
            self.config.repeats_per_layer,
            self.config.size
        );
        Ok(())
    }

    /// Run one frame if `handle` is the one this instance is waiting on.
    ///
    /// Returns whether the tick was accepted.
    pub fn on_frame(&mut self, handle: AnimationHandle, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.state != AnimatorState::Running || self.handle != Some(handle) {
            return false;
        }
        self.ticks += 1;

        let frozen = self.config.rotation_speed == 0.0;
        if !(self.options.skip_static_redraw && frozen && self.frames_drawn > 0) {
            self.draw();
            self.frames_drawn += 1;
        }
        self.rotation.advance(self.config.rotation_speed);
        self.handle = Some(scheduler.request_frame());
        true
    }

    fn draw(&mut self) {
        let cfg = self.config;
        let size = cfg.size;
        let center = Point2D::new(cfg.center(), cfg.center());

        self.surface.clear(size, size);
        self.surface.fill_background(Color::WHITE);
        self.surface.set_transform(center, self.rotation.radians());
        for layer_index in 1..=cfg.layers {
            let spec = LayerSpec {
                layer_index,
                layers: cfg.layers,
                repeats: cfg.repeats_per_layer,
                size,
                pattern: cfg.pattern.name(),
                scheme: cfg.color_scheme,
            };
            let layer = compose_layer(&self.registry, &spec, &self.options);
            paint_layer(&mut self.surface, &layer);
        }
        self.surface.reset_transform();
    }

    /// Cancel the pending frame. No tick fires for this instance afterwards.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel_frame(handle);
        }
        if self.state != AnimatorState::Stopped {
            log::debug!(
                "animator stopped after {} frames at {:.4} rad",
                self.frames_drawn,
                self.rotation.radians()
            );
        }
        self.state = AnimatorState::Stopped;
    }

    /// Swap in a config that differs only in style, keeping the rotation phase.
    ///
    /// Returns false (and changes nothing) when geometry differs; the caller
    /// must restart instead.
    pub fn apply_style(&mut self, config: MandalaConfig) -> bool {
        let config = config.sanitized();
        match self.config.classify_change(&config) {
            crate::config::ConfigChange::Geometry => false,
            _ => {
                self.config = config;
                self.frames_drawn = 0;
                true
            }
        }
    }

    /// Move drawing onto a new surface, keeping the rotation phase and the
    /// pending frame. Returns the old surface.
    ///
    /// The next accepted tick always redraws, even with static redraws
    /// skipped.
    pub fn replace_surface(&mut self, surface: S) -> Result<S, AnimatorError> {
        let (width, height) = surface.pixel_size();
        if width == 0 || height == 0 {
            log::error!("surface not replaced: new surface is {width}x{height}");
            return Err(AnimatorError::SurfaceUnavailable { width, height });
        }
        self.frames_drawn = 0;
        Ok(std::mem::replace(&mut self.surface, surface))
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn config(&self) -> &MandalaConfig {
        &self.config
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn handle(&self) -> Option<AnimationHandle> {
        self.handle
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Accepted ticks, including ones that skipped a static redraw.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}
