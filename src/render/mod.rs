mod braille;
mod halfblock;
mod kitty;

pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;
pub use kitty::{KittyRenderer, KITTY_IMAGE_ID};

use std::io::Write;

/// One composed terminal frame: the mandala pixels plus HUD text.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    /// Pixels per terminal cell (columns, rows) this renderer expects.
    fn cell_pixels(&self) -> (usize, usize);
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

/// Bottom-of-screen status line, truncated to the terminal width.
pub fn write_hud_line(out: &mut dyn Write, row: usize, cols: usize, line: Option<&str>) -> anyhow::Result<()> {
    write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
    if let Some(line) = line {
        let clipped: String = line.chars().take(cols).collect();
        out.write_all(b"\x1b[38;2;40;40;40m\x1b[48;2;236;236;228m")?;
        write!(out, "{clipped}")?;
        out.write_all(b"\x1b[0m")?;
    }
    Ok(())
}

pub(crate) fn write_pixel_buffer_error(out: &mut dyn Write, frame: &Frame<'_>, need: usize) -> anyhow::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    out.write_all(b"\x1b[H\x1b[0m\x1b[2J")?;
    write!(
        out,
        "pixel buffer too small (need {}, got {})",
        need,
        frame.pixels_rgba.len()
    )?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn write_hud(out: &mut dyn Write, frame: &Frame<'_>) -> anyhow::Result<()> {
    let cols = frame.term_cols as usize;
    let mut lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write_hud_line(out, frame.visual_rows as usize + i + 1, cols, lines.next())?;
    }
    Ok(())
}

/// Centered boxed text (help screen) over whatever is already drawn.
pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner_w = cols.saturating_sub(6).max(1);
    let lines: Vec<String> = text
        .lines()
        .flat_map(|raw| wrap_chars(raw, max_inner_w))
        .collect();
    if lines.is_empty() {
        return Ok(());
    }

    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_w = (widest.clamp(1, max_inner_w) + 4).min(cols.saturating_sub(2)).max(4);
    let inner_w = box_w.saturating_sub(4);
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = (body_h + 2).min(rows.saturating_sub(1)).max(3);

    let left = (cols.saturating_sub(box_w)) / 2 + 1;
    let top = (rows.saturating_sub(box_h)) / 2 + 1;
    let edge = "-".repeat(box_w.saturating_sub(2));
    let blank = " ".repeat(inner_w);

    // Ink on paper, matching the mandala's white background.
    out.write_all(b"\x1b[0m\x1b[38;2;20;20;20m\x1b[48;2;250;248;240m")?;
    write!(out, "\x1b[{top};{left}H+{edge}+")?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = top + 1 + i;
        write!(out, "\x1b[{row};{left}H| {blank} |")?;
        if i == 0 {
            write!(out, "\x1b[{row};{}H\x1b[1m{line}\x1b[22m", left + 2)?;
        } else {
            write!(out, "\x1b[{row};{}H{line}", left + 2)?;
        }
    }
    write!(out, "\x1b[{};{left}H+{edge}+", top + box_h - 1)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}

fn wrap_chars(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}
