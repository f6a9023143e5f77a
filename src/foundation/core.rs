use std::time::Duration;

use crate::foundation::error::{CirrusError, CirrusResult};

/// Character-cell dimensions of a drawable area.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Viewport {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl Viewport {
    /// Size assumed when a peer never reports one.
    pub const FALLBACK: Viewport = Viewport {
        width: 80,
        height: 24,
    };

    /// Largest size a session will render; bigger reports are clamped to it.
    pub const MAX: Viewport = Viewport {
        width: 1000,
        height: 500,
    };

    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of cells (`width * height`).
    pub fn area(self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Replace zero dimensions with the fallback size, per axis.
    pub fn or_fallback(self) -> Self {
        Self {
            width: if self.width == 0 {
                Self::FALLBACK.width
            } else {
                self.width
            },
            height: if self.height == 0 {
                Self::FALLBACK.height
            } else {
                self.height
            },
        }
    }

    /// Limit each axis to [`Viewport::MAX`].
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.min(Self::MAX.width),
            height: self.height.min(Self::MAX.height),
        }
    }

    /// Return `true` when `(x, y)` addresses a cell inside the viewport.
    pub fn contains(self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
}

/// Integer frames-per-second target, always non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps(u32);

impl Fps {
    pub fn new(fps: u32) -> CirrusResult<Self> {
        if fps == 0 {
            return Err(CirrusError::validation("fps must be non-zero"));
        }
        Ok(Self(fps))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Target wall-clock duration of one frame.
    pub fn frame_interval(self) -> Duration {
        Duration::from_secs_f64(self.frame_secs())
    }

    pub fn frame_secs(self) -> f64 {
        1.0 / f64::from(self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
