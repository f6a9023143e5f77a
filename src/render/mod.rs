pub mod glyph_renderer;
pub mod overlay;
pub mod ramp;
