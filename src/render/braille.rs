use crate::render::{draw_overlay_popup, write_hud, write_pixel_buffer_error, Frame, Renderer};
use std::io::Write;

/// 2x4 dots per cell. Each cell is split at its mid luma into "ink" dots and
/// "paper" dots, drawn with their average colors.
pub struct BrailleRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

#[derive(Default)]
struct ColorSum {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl ColorSum {
    fn add(&mut self, (r, g, b): (u8, u8, u8)) {
        self.r += u32::from(r);
        self.g += u32::from(g);
        self.b += u32::from(b);
        self.n += 1;
    }

    fn mean(&self) -> Option<(u8, u8, u8)> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (2, 4)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let w = frame.pixel_width;
        let h = frame.pixel_height;

        if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
            return Ok(());
        }
        if w != cols.saturating_mul(2) || h != visual_rows.saturating_mul(4) {
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
        out.write_all(b"\x1b[?7l")?;
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..visual_rows {
            for col in 0..cols {
                let mut lum = [0u16; 8];
                let mut rgb = [(0u8, 0u8, 0u8); 8];
                for dy in 0..4usize {
                    for dx in 0..2usize {
                        let i = dy * 2 + dx;
                        let idx = ((row * 4 + dy) * w + col * 2 + dx) * 4;
                        let c = (
                            frame.pixels_rgba[idx],
                            frame.pixels_rgba[idx + 1],
                            frame.pixels_rgba[idx + 2],
                        );
                        rgb[i] = c;
                        lum[i] = luma_u16(c.0, c.1, c.2);
                    }
                }

                let min_l = lum.iter().copied().min().unwrap_or(0);
                let max_l = lum.iter().copied().max().unwrap_or(0);
                let thr = (min_l + max_l) / 2;

                // Dark dots are ink on this light background.
                let mut bits = 0u8;
                let mut ink = ColorSum::default();
                let mut paper = ColorSum::default();
                for i in 0..8 {
                    if max_l > min_l && lum[i] <= thr {
                        bits |= DOT_BITS[i];
                        ink.add(rgb[i]);
                    } else {
                        paper.add(rgb[i]);
                    }
                }

                let bgc = paper.mean().unwrap_or((255, 255, 255));
                let (fgc, ch) = match ink.mean() {
                    Some(c) => (c, char::from_u32(0x2800 + u32::from(bits)).unwrap_or(' ')),
                    None => (bgc, ' '),
                };

                if self.last_fg != Some(fgc) {
                    write!(out, "\x1b[38;2;{};{};{}m", fgc.0, fgc.1, fgc.2)?;
                    self.last_fg = Some(fgc);
                }
                if self.last_bg != Some(bgc) {
                    write!(out, "\x1b[48;2;{};{};{}m", bgc.0, bgc.1, bgc.2)?;
                    self.last_bg = Some(bgc);
                }
                write!(out, "{ch}")?;
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

#[inline]
fn luma_u16(r: u8, g: u8, b: u8) -> u16 {
    // Rec.709 weights in 8.8 fixed point.
    ((u32::from(r) * 54 + u32::from(g) * 183 + u32::from(b) * 19) >> 8) as u16
}
