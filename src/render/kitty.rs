use crate::render::{draw_overlay_popup, write_hud, Frame, Renderer};
use anyhow::{Context, anyhow};
use base64::Engine;
use std::fs;
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KittyTransport {
    /// Pixels inline as base64 chunks.
    Direct,
    /// Pixels written to a temp file the terminal reads and deletes.
    File,
}

impl KittyTransport {
    fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::File => "file",
        }
    }
}

/// Id of the single image the kitty presenter places and replaces.
pub const KITTY_IMAGE_ID: u32 = 1;

/// Kitty graphics protocol: the whole mandala as one RGBA image placement.
pub struct KittyRenderer {
    image_id: u32,
    temp_path: String,
    temp_payload_b64: String,
    transports: Vec<KittyTransport>,
    active_transport_idx: usize,
    b64_buf: Vec<u8>,
    overlay_visible_last: bool,
    last_hud_rows: u16,
}

impl KittyRenderer {
    pub fn new() -> Self {
        let temp_path = format!("/tmp/mandala-{}.rgba", std::process::id());
        let temp_payload_b64 = base64::engine::general_purpose::STANDARD.encode(temp_path.as_bytes());
        Self {
            image_id: KITTY_IMAGE_ID,
            temp_path,
            temp_payload_b64,
            transports: pick_transport_chain(),
            active_transport_idx: 0,
            b64_buf: Vec::new(),
            overlay_visible_last: false,
            last_hud_rows: 0,
        }
    }

    fn write_with_transport(
        &mut self,
        transport: KittyTransport,
        frame: &Frame<'_>,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let placement = Placement {
            w: frame.pixel_width,
            h: frame.pixel_height,
            cols: frame.term_cols as usize,
            rows: frame.visual_rows as usize,
            image_id: self.image_id,
        };
        match transport {
            KittyTransport::Direct => {
                write_kitty_direct_rgba(out, frame.pixels_rgba, &placement, &mut self.b64_buf)
            }
            KittyTransport::File => {
                fs::write(self.temp_path.as_str(), frame.pixels_rgba)
                    .with_context(|| format!("write kitty temp file {}", self.temp_path))?;
                write!(
                    out,
                    "\x1b_Ga=T,f=32,{},t=t;{}\x1b\\",
                    placement.keys(),
                    self.temp_payload_b64
                )?;
                Ok(())
            }
        }
    }
}

impl Default for KittyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

struct Placement {
    w: usize,
    h: usize,
    cols: usize,
    rows: usize,
    image_id: u32,
}

impl Placement {
    fn keys(&self) -> String {
        format!(
            "s={},v={},i={},p=1,c={},r={},C=1,q=2,z=-1",
            self.w, self.h, self.image_id, self.cols, self.rows
        )
    }
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
    }

    fn cell_pixels(&self) -> (usize, usize) {
        (2, 4)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let visual_rows = frame.visual_rows as usize;
        if frame.term_cols == 0 || visual_rows == 0 || frame.pixel_width == 0 || frame.pixel_height == 0 {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }

        if let Some(text) = frame.overlay {
            // Images sit above text; drop the image so the popup is readable.
            write!(out, "\x1b_Ga=d,d=I,i={}\x1b\\", self.image_id)?;
            clear_text_rows(out, frame.term_rows as usize)?;
            write_hud(out, frame)?;
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
            self.overlay_visible_last = true;
            self.last_hud_rows = frame.hud_rows;
            if frame.sync_updates {
                out.write_all(b"\x1b[?2026l")?;
            }
            out.flush()?;
            return Ok(());
        }

        out.write_all(b"\x1b[H")?;

        let count = self.transports.len();
        let start = self.active_transport_idx.min(count.saturating_sub(1));
        let mut last_err: Option<anyhow::Error> = None;
        let mut rendered = false;
        for step in 0..count {
            let idx = (start + step) % count;
            let transport = self.transports[idx];
            match self.write_with_transport(transport, frame, out) {
                Ok(()) => {
                    if idx != self.active_transport_idx {
                        log::info!("kitty transport switched to {}", transport.label());
                    }
                    self.active_transport_idx = idx;
                    rendered = true;
                    break;
                }
                Err(err) => {
                    // Terminal IO failures are not transport-specific.
                    if err.downcast_ref::<std::io::Error>().is_some() {
                        return Err(err);
                    }
                    last_err = Some(err.context(format!("kitty transport '{}' failed", transport.label())));
                }
            }
        }
        if !rendered {
            return Err(last_err.unwrap_or_else(|| anyhow!("no kitty transport succeeded")));
        }

        if frame.hud_rows != self.last_hud_rows {
            clear_text_rows(out, frame.term_rows as usize)?;
        }
        if self.overlay_visible_last {
            clear_text_rows(out, visual_rows)?;
        }
        write_hud(out, frame)?;

        self.overlay_visible_last = false;
        self.last_hud_rows = frame.hud_rows;

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Drop for KittyRenderer {
    fn drop(&mut self) {
        let _ = fs::remove_file(self.temp_path.as_str());
    }
}

fn pick_transport_chain() -> Vec<KittyTransport> {
    if let Ok(v) = std::env::var("MANDALA_KITTY_TRANSPORT") {
        match v.trim().to_ascii_lowercase().as_str() {
            "direct" | "d" => return vec![KittyTransport::Direct],
            "file" | "f" | "temp" | "tempfile" => return vec![KittyTransport::File],
            _ => {}
        }
    }
    vec![KittyTransport::Direct, KittyTransport::File]
}

fn write_kitty_direct_rgba(
    out: &mut dyn Write,
    rgba: &[u8],
    placement: &Placement,
    b64_buf: &mut Vec<u8>,
) -> anyhow::Result<()> {
    // Multiple of 3 so every chunk encodes without padding until the last.
    const RAW_CHUNK: usize = 3 * 1024;

    if rgba.is_empty() {
        return Ok(());
    }

    let mut chunks = rgba.chunks(RAW_CHUNK).peekable();
    let mut first = true;
    while let Some(chunk) = chunks.next() {
        let b64_len = chunk.len().div_ceil(3) * 4;
        if b64_buf.len() < b64_len {
            b64_buf.resize(b64_len, 0);
        }
        let written = base64::engine::general_purpose::STANDARD
            .encode_slice(chunk, &mut b64_buf[..b64_len])
            .context("base64 encode pixels")?;

        let more = u8::from(chunks.peek().is_some());
        if first {
            write!(out, "\x1b_Ga=T,f=32,{},t=d,m={more};", placement.keys())?;
            first = false;
        } else {
            write!(out, "\x1b_Gm={more};")?;
        }
        out.write_all(&b64_buf[..written])?;
        out.write_all(b"\x1b\\")?;
    }
    Ok(())
}

fn clear_text_rows(out: &mut dyn Write, rows: usize) -> anyhow::Result<()> {
    for row in 1..=rows {
        write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
    }
    Ok(())
}
