use std::io::Write;

use crate::foundation::core::Viewport;
use crate::render::ramp::{GlyphRamp, RampStyle};

/// Clear the whole screen and home the cursor.
pub const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
pub const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";

const BLANK: char = ' ';

/// Double-buffered character grid that quantizes densities into glyphs.
///
/// Writes land in the back buffer. [`GlyphRenderer::present`] serializes it and swaps it to the
/// front, which then holds exactly what was last sent to the terminal.
#[derive(Clone, Debug)]
pub struct GlyphRenderer {
    viewport: Viewport,
    style: RampStyle,
    back: Vec<char>,
    front: Vec<char>,
}

impl GlyphRenderer {
    pub fn new(viewport: Viewport, style: RampStyle) -> Self {
        Self {
            viewport,
            style,
            back: vec![BLANK; viewport.area()],
            front: vec![BLANK; viewport.area()],
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn width(&self) -> usize {
        self.viewport.width
    }

    pub fn height(&self) -> usize {
        self.viewport.height
    }

    pub fn style(&self) -> RampStyle {
        self.style
    }

    pub fn ramp(&self) -> &'static GlyphRamp {
        self.style.ramp()
    }

    /// Switch ramps. Existing cells are kept; only later writes use the new ramp.
    pub fn set_style(&mut self, style: RampStyle) {
        self.style = style;
    }

    pub fn next_style(&mut self) -> RampStyle {
        self.style = self.style.next();
        self.style
    }

    /// Reallocate both buffers for a new size. Contents are cleared.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.back = vec![BLANK; viewport.area()];
        self.front = vec![BLANK; viewport.area()];
    }

    /// Blank the back buffer; called at the start of every render cycle.
    pub fn clear(&mut self) {
        self.back.fill(BLANK);
    }

    fn cell(&self, x: isize, y: isize) -> Option<usize> {
        self.viewport
            .contains(x, y)
            .then(|| y as usize * self.viewport.width + x as usize)
    }

    /// Quantize `density` with the active ramp and write it. Out-of-bounds cells are ignored.
    pub fn set_pixel(&mut self, x: isize, y: isize, density: f64) {
        if let Some(i) = self.cell(x, y) {
            let ramp = self.style.ramp();
            self.back[i] = ramp.glyph(ramp.quantize(density));
        }
    }

    /// Max-density compositing: the cell never gets lighter.
    ///
    /// Glyphs that are not in the active ramp read back as density 0.
    pub fn blend_pixel(&mut self, x: isize, y: isize, density: f64) {
        let Some(i) = self.cell(x, y) else {
            return;
        };
        let ramp = self.style.ramp();
        let current = ramp.density_of(ramp.index_of(self.back[i]).unwrap_or(0));
        self.set_pixel(x, y, current.max(density));
    }

    /// Write a literal glyph, bypassing quantization.
    pub fn put_glyph(&mut self, x: isize, y: isize, glyph: char) {
        if let Some(i) = self.cell(x, y) {
            self.back[i] = glyph;
        }
    }

    /// Glyph in the back (being drawn) buffer.
    pub fn glyph_at(&self, x: isize, y: isize) -> Option<char> {
        self.cell(x, y).map(|i| self.back[i])
    }

    /// Glyph in the front buffer (last presented frame).
    pub fn presented_glyph_at(&self, x: isize, y: isize) -> Option<char> {
        self.cell(x, y).map(|i| self.front[i])
    }

    /// Serialize the back buffer: clear-and-home, one row per line, trailing carriage return.
    pub fn render_to_string(&self) -> String {
        let w = self.viewport.width;
        let mut out = String::with_capacity(
            CLEAR_AND_HOME.len() + self.back.len() * 3 + 2 * self.viewport.height + 1,
        );
        out.push_str(CLEAR_AND_HOME);
        if w > 0 {
            for (row, cells) in self.back.chunks(w).enumerate() {
                if row > 0 {
                    out.push_str("\r\n");
                }
                out.extend(cells.iter());
            }
        }
        out.push('\r');
        out
    }

    /// Serialize the back buffer and swap it to the front.
    pub fn present(&mut self) -> String {
        let frame = self.render_to_string();
        std::mem::swap(&mut self.front, &mut self.back);
        frame
    }

    /// Present to a synchronous writer and flush it.
    pub fn flush<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let frame = self.present();
        out.write_all(frame.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/glyph_renderer.rs"]
mod tests;
