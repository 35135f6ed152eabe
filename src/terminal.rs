//! Terminal session for the presenters.
//!
//! The session owns the modes the presenters toggle mid-frame (synchronized
//! updates, autowrap, colors, the kitty image) and puts every one of them
//! back when dropped, even if a frame was cut short.

use crate::config::RendererMode;
use crate::render::KITTY_IMAGE_ID;
use anyhow::Context;
use crossterm::{
    cursor,
    style::{Color, SetBackgroundColor},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::io::{stdout, BufWriter, Stdout, Write};

pub const MIN_COLS: u16 = 4;
pub const MIN_ROWS: u16 = 2;

/// Refuse terminals that cannot hold one canvas row plus one column pair.
pub fn check_size(size: (u16, u16)) -> anyhow::Result<()> {
    if size.0 < MIN_COLS || size.1 < MIN_ROWS {
        anyhow::bail!(
            "terminal too small (need at least {MIN_COLS}x{MIN_ROWS}, got {}x{})",
            size.0,
            size.1
        );
    }
    Ok(())
}

/// Bytes that undo whatever a partially written frame left switched on.
pub fn restore_sequence(sync_updates: bool, kitty_image: Option<u32>) -> Vec<u8> {
    let mut seq = Vec::with_capacity(48);
    if sync_updates {
        seq.extend_from_slice(b"\x1b[?2026l");
    }
    if let Some(id) = kitty_image {
        seq.extend_from_slice(format!("\x1b_Ga=d,d=I,i={id},q=2\x1b\\").as_bytes());
    }
    seq.extend_from_slice(b"\x1b[?7h\x1b[0m");
    seq
}

/// Raw mode, alternate screen and a white page for the session's lifetime.
pub struct TerminalSession {
    sync_updates: bool,
    kitty_image: Option<u32>,
    size: (u16, u16),
}

impl TerminalSession {
    pub fn open(sync_updates: bool, renderer: RendererMode) -> anyhow::Result<Self> {
        let size = terminal::size().context("get terminal size")?;
        check_size(size)?;

        terminal::enable_raw_mode().context("enable raw mode")?;
        // From here on Drop restores the terminal, even if setup fails below.
        let session = Self {
            sync_updates,
            kitty_image: (renderer == RendererMode::Kitty).then_some(KITTY_IMAGE_ID),
            size,
        };

        let mut out = stdout();
        out.queue(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?
            .queue(cursor::Hide)
            .context("hide cursor")?
            .queue(SetBackgroundColor(Color::Rgb { r: 255, g: 255, b: 255 }))
            .context("set paper color")?
            .queue(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.flush().context("flush terminal setup")?;

        log::debug!(
            "terminal session open at {}x{} (sync updates {})",
            size.0,
            size.1,
            if sync_updates { "on" } else { "off" }
        );
        Ok(session)
    }

    pub fn writer() -> BufWriter<Stdout> {
        BufWriter::new(stdout())
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Record a size reported by a resize event. Returns whether it changed.
    pub fn resized(&mut self, size: (u16, u16)) -> bool {
        let changed = size != self.size;
        self.size = size;
        changed
    }

    /// Re-read the size directly; some terminals drop resize events.
    pub fn refresh_size(&mut self) -> anyhow::Result<bool> {
        let size = terminal::size().context("get terminal size")?;
        Ok(self.resized(size))
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        let _ = out.write_all(&restore_sequence(self.sync_updates, self.kitty_image));
        let _ = out.queue(cursor::Show);
        let _ = out.queue(terminal::LeaveAlternateScreen);
        let _ = out.flush();
    }
}
