//! Glyph ramps: ordered character palettes used to quantize density, lightest first.

/// A light-to-dark palette of at least two glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: &'static [char],
}

impl GlyphRamp {
    const fn new(glyphs: &'static [char]) -> Self {
        assert!(glyphs.len() >= 2);
        Self { glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &'static [char] {
        self.glyphs
    }

    pub fn lightest(&self) -> char {
        self.glyphs[0]
    }

    pub fn darkest(&self) -> char {
        self.glyphs[self.glyphs.len() - 1]
    }

    /// Glyph at ramp index `i`, clamped to the ramp.
    pub fn glyph(&self, i: usize) -> char {
        self.glyphs[i.min(self.glyphs.len() - 1)]
    }

    /// Map `density` in `[0, 1]` to a ramp index with `round(density * (len - 1))`.
    ///
    /// Out-of-range input clamps; NaN maps to the lightest glyph.
    pub fn quantize(&self, density: f64) -> usize {
        let max = (self.glyphs.len() - 1) as f64;
        let idx = (density * max).round();
        if idx.is_nan() {
            return 0;
        }
        idx.clamp(0.0, max) as usize
    }

    pub fn index_of(&self, glyph: char) -> Option<usize> {
        self.glyphs.iter().position(|&g| g == glyph)
    }

    /// Density represented by ramp index `i` (`i / (len - 1)`).
    pub fn density_of(&self, i: usize) -> f64 {
        i.min(self.glyphs.len() - 1) as f64 / (self.glyphs.len() - 1) as f64
    }
}

const DOTS: GlyphRamp = GlyphRamp::new(&[
    ' ', '.', '·', '⋅', '∙', '•', '∘', '○', '●', '◉', '⬤',
]);
const STIPPLE: GlyphRamp = GlyphRamp::new(&[
    ' ', '.', '·', ':', '∴', '∵', '⁘', '⁙', '∷', '≈', '≋',
]);
const FINE: GlyphRamp = GlyphRamp::new(&[
    ' ', '.', '·', '˙', '∙', '⋅', '∘', '○', '◌', '●', '◉', '⦿',
]);
const BLOCKS: GlyphRamp = GlyphRamp::new(&[' ', '░', '▒', '▓', '█']);
const DENSITY: GlyphRamp = GlyphRamp::new(&[' ', '·', ':', '-', '=', '+', '*', '#', '%', '@']);

/// Named glyph ramps selectable at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RampStyle {
    #[default]
    Dots,
    Stipple,
    Fine,
    Blocks,
    Density,
}

impl RampStyle {
    /// Every style, in cycling order.
    pub const ALL: [RampStyle; 5] = [
        RampStyle::Dots,
        RampStyle::Stipple,
        RampStyle::Fine,
        RampStyle::Blocks,
        RampStyle::Density,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Dots => "dots",
            Self::Stipple => "stipple",
            Self::Fine => "fine",
            Self::Blocks => "blocks",
            Self::Density => "density",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Parse `name`, falling back to [`RampStyle::default`] for unknown names.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            let fallback = Self::default();
            tracing::warn!(
                requested = name,
                using = fallback.name(),
                "unknown render style"
            );
            fallback
        })
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn ramp(self) -> &'static GlyphRamp {
        match self {
            Self::Dots => &DOTS,
            Self::Stipple => &STIPPLE,
            Self::Fine => &FINE,
            Self::Blocks => &BLOCKS,
            Self::Density => &DENSITY,
        }
    }
}

impl From<String> for RampStyle {
    fn from(name: String) -> Self {
        Self::from_name_or_default(&name)
    }
}

impl From<RampStyle> for String {
    fn from(style: RampStyle) -> Self {
        style.name().to_string()
    }
}

impl std::fmt::Display for RampStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/ramp.rs"]
mod tests;
