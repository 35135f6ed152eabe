use crate::render::{draw_overlay_popup, write_hud, write_pixel_buffer_error, Frame, Renderer};
use std::io::Write;

/// Two vertical pixels per cell: top in the foreground, bottom in the background.
pub struct HalfBlockRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (1, 2)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let w = frame.pixel_width;
        let h = frame.pixel_height;

        if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
            return Ok(());
        }
        if w != cols || h != visual_rows.saturating_mul(2) {
            return Ok(());
        }

        let need = w.saturating_mul(h).saturating_mul(4);
        if frame.pixels_rgba.len() < need {
            return write_pixel_buffer_error(out, frame, need);
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }

        out.write_all(b"\x1b[H\x1b[0m")?;
        // Autowrap off: writing the last column must not push a blank line.
        out.write_all(b"\x1b[?7l")?;
        self.last_fg = None;
        self.last_bg = None;

        const HALF_BLOCK: char = '\u{2580}';

        let px = |i: usize| {
            (
                frame.pixels_rgba[i],
                frame.pixels_rgba[i + 1],
                frame.pixels_rgba[i + 2],
            )
        };

        for row in 0..visual_rows {
            let top_y = row * 2;
            for x in 0..cols {
                let top = px((top_y * w + x) * 4);
                let bottom = px(((top_y + 1) * w + x) * 4);

                if self.last_fg != Some(top) {
                    write!(out, "\x1b[38;2;{};{};{}m", top.0, top.1, top.2)?;
                    self.last_fg = Some(top);
                }
                if self.last_bg != Some(bottom) {
                    write!(out, "\x1b[48;2;{};{};{}m", bottom.0, bottom.1, bottom.2)?;
                    self.last_bg = Some(bottom);
                }
                write!(out, "{HALF_BLOCK}")?;
            }
            out.write_all(b"\r\n")?;
        }

        write_hud(out, frame)?;

        if let Some(text) = frame.overlay {
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
        }

        out.write_all(b"\x1b[?7h")?;

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}
