use crate::field::layer::{DensityField, LayerParams};
use crate::foundation::core::Viewport;
use crate::foundation::error::{CirrusError, CirrusResult};
use crate::render::glyph_renderer::GlyphRenderer;
use crate::source::StreamSource;

/// Gamma applied to the blended density; below 1 lifts mid-tones.
pub const GAMMA: f64 = 0.8;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Background, mid-ground and foreground layers with foreground-biased weights.
pub fn default_layers() -> Vec<(LayerParams, f64)> {
    vec![
        (
            LayerParams {
                speed: 0.3,
                scale: 0.03,
                octaves: 3,
                persistence: 0.6,
                lacunarity: 2.0,
                seed: 42,
            },
            0.25,
        ),
        (
            LayerParams {
                speed: 0.6,
                scale: 0.06,
                octaves: 4,
                persistence: 0.55,
                lacunarity: 2.0,
                seed: 123,
            },
            0.35,
        ),
        (
            LayerParams {
                speed: 1.0,
                scale: 0.1,
                octaves: 5,
                persistence: 0.5,
                lacunarity: 2.0,
                seed: 456,
            },
            0.40,
        ),
    ]
}

/// Parallax cloud animation: several [`DensityField`]s blended into one density per cell.
#[derive(Clone, Debug)]
pub struct CloudCompositor {
    viewport: Viewport,
    layers: Vec<DensityField>,
    weights: Vec<f64>,
}

impl CloudCompositor {
    pub fn new(viewport: Viewport) -> Self {
        let (layers, weights) = default_layers()
            .into_iter()
            .map(|(p, w)| (DensityField::new(viewport, p), w))
            .unzip();
        Self {
            viewport,
            layers,
            weights,
        }
    }

    /// Build from explicit layers. Weights must be non-negative and sum to 1.
    pub fn with_layers(viewport: Viewport, layers: Vec<(LayerParams, f64)>) -> CirrusResult<Self> {
        if layers.is_empty() {
            return Err(CirrusError::validation(
                "cloud compositor needs at least one layer",
            ));
        }
        if layers.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(CirrusError::validation(
                "layer weights must be finite and non-negative",
            ));
        }
        let total: f64 = layers.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CirrusError::validation(format!(
                "layer weights must sum to 1.0, got {total}"
            )));
        }

        let (layers, weights) = layers
            .into_iter()
            .map(|(p, w)| (DensityField::new(viewport, p), w))
            .unzip();
        Ok(Self {
            viewport,
            layers,
            weights,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn layers(&self) -> &[DensityField] {
        &self.layers
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn advance(&mut self, dt: f64) {
        for layer in &mut self.layers {
            layer.advance(dt);
        }
    }

    /// Weighted blend of all layers, gamma-corrected and clamped to `[0, 1]`.
    pub fn combined_density(&self, x: f64, y: f64) -> f64 {
        let total: f64 = self
            .layers
            .iter()
            .zip(&self.weights)
            .map(|(layer, w)| layer.sample(x, y) * w)
            .sum();
        total.max(0.0).powf(GAMMA).clamp(0.0, 1.0)
    }

    /// Fill every cell of the renderer's current grid.
    pub fn render_into(&self, renderer: &mut GlyphRenderer) {
        for y in 0..renderer.height() {
            for x in 0..renderer.width() {
                let d = self.combined_density(x as f64, y as f64);
                renderer.set_pixel(x as isize, y as isize, d);
            }
        }
    }

    /// Only the addressable area changes; layers keep seed, scale, speed and phase.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for layer in &mut self.layers {
            layer.resize(viewport);
        }
    }
}

impl StreamSource for CloudCompositor {
    fn update(&mut self, dt: f64) {
        self.advance(dt);
    }

    fn render(&self, renderer: &mut GlyphRenderer) {
        self.render_into(renderer);
    }

    fn is_available(&mut self) -> bool {
        true
    }

    fn cleanup(&mut self) {}

    fn resize(&mut self, viewport: Viewport) {
        CloudCompositor::resize(self, viewport);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/field/compositor.rs"]
mod tests;
