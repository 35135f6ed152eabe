//! Decide which presenter the current terminal can actually show.

use crate::config::RendererMode;

/// Set to `1`/`0` (or `on`/`off`) to skip kitty detection.
pub const FORCE_KITTY_ENV: &str = "MANDALA_FORCE_KITTY";

#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub auto_probe: bool,
    pub requested_renderer: RendererMode,
    pub renderer: RendererMode,
    notes: Vec<String>,
}

impl CapabilityReport {
    pub fn changed(&self) -> bool {
        self.renderer != self.requested_renderer
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Short form for the HUD, e.g. `fallback kitty->half-block`.
    pub fn status_label(&self) -> String {
        let chosen = self.renderer.name();
        if !self.auto_probe {
            format!("off ({chosen})")
        } else if self.changed() {
            format!("fallback {}->{chosen}", self.requested_renderer.name())
        } else {
            format!("ok {chosen}")
        }
    }
}

pub fn probe_runtime(requested_renderer: RendererMode, auto_probe: bool) -> CapabilityReport {
    let kitty_ok = kitty_graphics_from(|key| std::env::var(key).ok());
    probe_with(requested_renderer, auto_probe, kitty_ok)
}

/// Probe with an explicit answer for kitty graphics support.
///
/// Only the kitty presenter needs anything from the terminal beyond 24-bit
/// color, so it is the only request that can fall back.
pub fn probe_with(requested_renderer: RendererMode, auto_probe: bool, kitty_ok: bool) -> CapabilityReport {
    let mut report = CapabilityReport {
        auto_probe,
        requested_renderer,
        renderer: requested_renderer,
        notes: Vec::new(),
    };

    if !auto_probe {
        report
            .notes
            .push(format!("probe disabled; using {} as requested", requested_renderer.name()));
    } else if requested_renderer == RendererMode::Kitty && !kitty_ok {
        report.renderer = RendererMode::HalfBlock;
        report.notes.push(format!(
            "kitty graphics not detected (set {FORCE_KITTY_ENV}=1 to override); falling back to half-block"
        ));
    } else {
        report
            .notes
            .push(format!("{} presenter available", requested_renderer.name()));
    }
    report
}

/// Kitty graphics support as seen through `env`.
///
/// The override wins when it parses. Otherwise only a kitty window id or the
/// `xterm-kitty` terminfo name count as support.
pub fn kitty_graphics_from(env: impl Fn(&str) -> Option<String>) -> bool {
    if let Some(forced) = env(FORCE_KITTY_ENV).as_deref().and_then(parse_switch) {
        return forced;
    }
    env("KITTY_WINDOW_ID").is_some() || env("TERM").is_some_and(|term| term.trim() == "xterm-kitty")
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
