pub mod orchestrator;

use crate::foundation::core::Viewport;
use crate::render::glyph_renderer::GlyphRenderer;

/// Capability set shared by every animation source.
///
/// Call order per frame: `update`, then `render` into a freshly cleared renderer.
pub trait StreamSource {
    /// Advance internal state by `dt` seconds of elapsed time.
    fn update(&mut self, dt: f64);

    /// Draw the current frame. Cells outside the renderer are clipped by the renderer.
    fn render(&self, renderer: &mut GlyphRenderer);

    /// Whether the source can currently produce frames.
    fn is_available(&mut self) -> bool;

    /// Release owned resources. Must be idempotent.
    fn cleanup(&mut self);

    fn resize(&mut self, _viewport: Viewport) {}
}
