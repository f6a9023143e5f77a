//! Logo overlay drawn on top of the animation.

use crate::render::glyph_renderer::GlyphRenderer;

const LOGO_BOLD: &[&str] = &[
    "██      ██ ███████ ██████   ██████  ███  ██  ████  ██",
    "██      ██ ██      ██   ██ ██    ██ ████ ██ ██  ██ ██",
    "██      ██ ███████ ██████  ██    ██ ██ ████ ██████ ██",
    "██      ██      ██ ██   ██ ██    ██ ██  ███ ██  ██ ██",
    "███████ ██ ███████ ██████   ██████  ██   ██ ██  ██ ██",
];

const LOGO_MINIMAL: &[&str] = &[
    "╦  ╦╔═╗╔╗ ╔═╗╔╗╔  ╔═╗╦",
    "║  ║╚═╗╠╩╗║ ║║║║  ╠═╣║",
    "╩═╝╩╚═╝╚═╝╚═╝╝╚╝  ╩ ╩╩",
];

const LOGO_ASCII: &[&str] = &[
    " _     ___ ____  ____   ___  _   _    _    ___ ",
    "| |   |_ _/ ___|| __ ) / _ \\| \\ | |  / \\  |_ _|",
    "| |    | |\\___ \\|  _ \\| | | |  \\| | / _ \\  | | ",
    "| |___ | | ___) | |_) | |_| | |\\  |/ ___ \\ | | ",
    "|_____|___|____/|____/ \\___/|_| \\_/_/   \\_\\___|",
];

const LOGO_SLANT: &[&str] = &[
    "   ____        __             ___   ____",
    "  / / /____   / /_  ___  ___ / _ | /  _/",
    " / / /(_-<  / _ \\/ _ \\/ _ / __ |_/ /  ",
    "/_/_//___/ /_.__/\\___/_//_/_/ |_/___/  ",
];

const LOGO_SIMPLE: &[&str] = &["LisbonAI"];

const LOGO_DOTS: &[&str] = &[
    "●●   ●● ●●●●● ●●●●   ●●●●  ●●●  ●●  ●  ●●●  ●●",
    "●●   ●● ●●    ●●  ●● ●●  ●● ●● ●● ●● ●● ●● ●● ●●",
    "●●   ●● ●●●●● ●●●●   ●●  ●● ●● ●● ●●●●● ●●●●● ●●",
    "●●   ●●    ●● ●●  ●● ●●  ●● ●● ●● ●● ●● ●● ●● ●●",
    "●●●●●●● ●●●●● ●●●●    ●●●●   ●●●  ●● ●  ●● ●● ●●",
];

const LOGO_CIRCLES: &[&str] = &[
    "○○   ○○ ○○○○○ ○○○○   ○○○○  ○○○  ○○  ○  ○○○  ○○",
    "○○   ○○ ○○    ○○  ○○ ○○  ○○ ○○ ○○ ○○ ○○ ○○ ○○ ○○",
    "○○   ○○ ○○○○○ ○○○○   ○○  ○○ ○○ ○○ ○○○○○ ○○○○○ ○○",
    "○○   ○○    ○○ ○○  ○○ ○○  ○○ ○○ ○○ ○○ ○○ ○○ ○○ ○○",
    "○○○○○○○ ○○○○○ ○○○○    ○○○○   ○○○  ○○ ○  ○○ ○○ ○○",
];

const LOGO_STIPPLE: &[&str] = &[
    "∙∙   ∙∙ ∙∙∙∙∙ ∙∙∙∙   ∙∙∙∙  ∙∙∙  ∙∙  ∙  ∙∙∙  ∙∙",
    "∙∙   ∙∙ ∙∙    ∙∙  ∙∙ ∙∙  ∙∙ ∙∙ ∙∙ ∙∙ ∙∙ ∙∙ ∙∙ ∙∙",
    "∙∙   ∙∙ ∙∙∙∙∙ ∙∙∙∙   ∙∙  ∙∙ ∙∙ ∙∙ ∙∙∙∙∙ ∙∙∙∙∙ ∙∙",
    "∙∙   ∙∙    ∙∙ ∙∙  ∙∙ ∙∙  ∙∙ ∙∙ ∙∙ ∙∙ ∙∙ ∙∙ ∙∙ ∙∙",
    "∙∙∙∙∙∙∙ ∙∙∙∙∙ ∙∙∙∙    ∙∙∙∙   ∙∙∙  ∙∙ ∙  ∙∙ ∙∙ ∙∙",
];

/// Named logo art sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OverlayStyle {
    #[default]
    Bold,
    Minimal,
    Ascii,
    Slant,
    Simple,
    Dots,
    Circles,
    Stipple,
}

impl OverlayStyle {
    pub const ALL: [OverlayStyle; 8] = [
        OverlayStyle::Bold,
        OverlayStyle::Minimal,
        OverlayStyle::Ascii,
        OverlayStyle::Slant,
        OverlayStyle::Simple,
        OverlayStyle::Dots,
        OverlayStyle::Circles,
        OverlayStyle::Stipple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Minimal => "minimal",
            Self::Ascii => "ascii",
            Self::Slant => "slant",
            Self::Simple => "simple",
            Self::Dots => "dots",
            Self::Circles => "circles",
            Self::Stipple => "stipple",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            let fallback = Self::default();
            tracing::warn!(
                requested = name,
                using = fallback.name(),
                "unknown overlay style"
            );
            fallback
        })
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn art(self) -> &'static [&'static str] {
        match self {
            Self::Bold => LOGO_BOLD,
            Self::Minimal => LOGO_MINIMAL,
            Self::Ascii => LOGO_ASCII,
            Self::Slant => LOGO_SLANT,
            Self::Simple => LOGO_SIMPLE,
            Self::Dots => LOGO_DOTS,
            Self::Circles => LOGO_CIRCLES,
            Self::Stipple => LOGO_STIPPLE,
        }
    }
}

impl From<String> for OverlayStyle {
    fn from(name: String) -> Self {
        Self::from_name_or_default(&name)
    }
}

impl From<OverlayStyle> for String {
    fn from(style: OverlayStyle) -> Self {
        style.name().to_string()
    }
}

impl std::fmt::Display for OverlayStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Draws the selected logo into a [`GlyphRenderer`].
#[derive(Clone, Debug)]
pub struct LogoOverlay {
    style: OverlayStyle,
    width: usize,
    height: usize,
}

impl LogoOverlay {
    pub fn new(style: OverlayStyle) -> Self {
        let mut overlay = Self {
            style,
            width: 0,
            height: 0,
        };
        overlay.set_style(style);
        overlay
    }

    pub fn style(&self) -> OverlayStyle {
        self.style
    }

    /// Width in characters of the widest art line.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_style(&mut self, style: OverlayStyle) {
        let art = style.art();
        self.style = style;
        self.width = art.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        self.height = art.len();
    }

    pub fn next_style(&mut self) -> OverlayStyle {
        self.set_style(self.style.next());
        self.style
    }

    /// Draw with the top-left corner at `(x, y)`; spaces are transparent.
    ///
    /// Full opacity writes the art glyphs literally. Lower opacity blends each covered cell up to
    /// `opacity` density, so the logo emerges from the clouds without erasing them.
    pub fn render_at(&self, renderer: &mut GlyphRenderer, x: isize, y: isize, opacity: f64) {
        if opacity <= 0.0 {
            return;
        }
        for (row, line) in self.style.art().iter().enumerate() {
            let cy = y + row as isize;
            for (col, glyph) in line.chars().enumerate() {
                if glyph == ' ' {
                    continue;
                }
                let cx = x + col as isize;
                if opacity >= 1.0 {
                    renderer.put_glyph(cx, cy, glyph);
                } else {
                    renderer.blend_pixel(cx, cy, opacity);
                }
            }
        }
    }

    pub fn render_bottom_right(
        &self,
        renderer: &mut GlyphRenderer,
        margin_x: usize,
        margin_y: usize,
        opacity: f64,
    ) {
        let x = renderer.width() as isize - self.width as isize - margin_x as isize;
        let y = renderer.height() as isize - self.height as isize - margin_y as isize;
        self.render_at(renderer, x, y, opacity);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
