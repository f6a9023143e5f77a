use noise::{NoiseFn, Perlin};

use crate::foundation::core::Viewport;

/// Exponent of the symmetric contrast curve applied to every sample.
pub const CONTRAST_POWER: f64 = 2.5;

/// Tunables of one noise layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerParams {
    /// Horizontal drift in cells per second.
    pub speed: f64,
    /// Noise-space units per cell; smaller zooms in.
    pub scale: f64,
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    pub seed: u32,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            scale: 0.1,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 0,
        }
    }
}

/// A seeded multi-octave Perlin layer that drifts sideways over time.
#[derive(Clone, Debug)]
pub struct DensityField {
    params: LayerParams,
    perlin: Perlin,
    viewport: Viewport,
    phase_x: f64,
    phase_y: f64,
}

impl DensityField {
    pub fn new(viewport: Viewport, params: LayerParams) -> Self {
        Self {
            perlin: Perlin::new(params.seed),
            params,
            viewport,
            phase_x: 0.0,
            phase_y: 0.0,
        }
    }

    pub fn params(&self) -> &LayerParams {
        &self.params
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Accumulated `(x, y)` phase offsets in cells.
    pub fn phase(&self) -> (f64, f64) {
        (self.phase_x, self.phase_y)
    }

    /// Drift horizontally by `speed * dt`. The vertical phase never moves.
    pub fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.phase_x += self.params.speed * dt;
        }
    }

    /// Change the addressable area. Seed, scale, speed and phase are untouched.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Contrast-shaped density in `[0, 1]` at cell `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let nx = (x + self.phase_x) * self.params.scale;
        let ny = (y + self.phase_y) * self.params.scale;
        if !nx.is_finite() || !ny.is_finite() {
            return 0.5;
        }
        let raw = self.fbm(nx, ny);
        let density = ((raw + 1.0) * 0.5).clamp(0.0, 1.0);
        apply_contrast(density, CONTRAST_POWER)
    }

    /// Fractal sum of octaves normalized by total amplitude, in `[-1, 1]`.
    fn fbm(&self, nx: f64, ny: f64) -> f64 {
        let mut amp = 1.0;
        let mut freq = 1.0;
        let mut sum = 0.0;
        let mut norm = 0.0;
        for _ in 0..self.params.octaves.max(1) {
            sum += self.perlin.get([nx * freq, ny * freq]) * amp;
            norm += amp;
            amp *= self.params.persistence;
            freq *= self.params.lacunarity;
        }
        let v = if norm > 0.0 { sum / norm } else { 0.0 };
        if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
    }
}

/// Push values below 0.5 toward 0 and values above toward 1.
pub fn apply_contrast(v: f64, power: f64) -> f64 {
    if v < 0.5 {
        0.5 * (2.0 * v).powf(power)
    } else {
        1.0 - 0.5 * (2.0 * (1.0 - v)).powf(power)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/field/layer.rs"]
mod tests;
