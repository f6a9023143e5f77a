use super::*;
use proptest::prelude::*;

fn renderer(w: usize, h: usize, style: RampStyle) -> GlyphRenderer {
    GlyphRenderer::new(Viewport::new(w, h), style)
}

#[test]
fn set_pixel_quantizes_with_active_ramp() {
    let mut r = renderer(3, 1, RampStyle::Blocks);
    r.set_pixel(0, 0, 0.0);
    r.set_pixel(1, 0, 0.5);
    r.set_pixel(2, 0, 1.0);
    assert_eq!(r.glyph_at(0, 0), Some(' '));
    assert_eq!(r.glyph_at(1, 0), Some('▒'));
    assert_eq!(r.glyph_at(2, 0), Some('█'));
}

#[test]
fn out_of_bounds_writes_are_ignored() {
    let mut r = renderer(2, 2, RampStyle::Blocks);
    r.set_pixel(-1, 0, 1.0);
    r.set_pixel(0, -1, 1.0);
    r.set_pixel(2, 0, 1.0);
    r.set_pixel(0, 2, 1.0);
    r.blend_pixel(5, 5, 1.0);
    r.put_glyph(-3, 1, 'X');
    assert_eq!(r.render_to_string(), format!("{CLEAR_AND_HOME}  \r\n  \r"));
    assert_eq!(r.glyph_at(2, 0), None);
}

#[test]
fn blend_keeps_the_denser_value() {
    let mut r = renderer(1, 1, RampStyle::Blocks);
    r.set_pixel(0, 0, 0.75);
    r.blend_pixel(0, 0, 0.25);
    assert_eq!(r.glyph_at(0, 0), Some('▓'));
    r.blend_pixel(0, 0, 1.0);
    assert_eq!(r.glyph_at(0, 0), Some('█'));
}

#[test]
fn blend_over_foreign_glyph_treats_it_as_empty() {
    let mut r = renderer(1, 1, RampStyle::Blocks);
    r.put_glyph(0, 0, 'Z');
    r.blend_pixel(0, 0, 0.25);
    assert_eq!(r.glyph_at(0, 0), Some('░'));
}

#[test]
fn style_change_preserves_buffer_contents() {
    let mut r = renderer(2, 1, RampStyle::Blocks);
    r.set_pixel(0, 0, 1.0);
    assert_eq!(r.next_style(), RampStyle::Density);
    assert_eq!(r.glyph_at(0, 0), Some('█'));
    r.set_pixel(1, 0, 1.0);
    assert_eq!(r.glyph_at(1, 0), Some('@'));
    r.set_style(RampStyle::Dots);
    assert_eq!(r.style(), RampStyle::Dots);
    assert_eq!(r.glyph_at(0, 0), Some('█'));
}

#[test]
fn serialization_uses_clear_home_rows_and_trailing_return() {
    let mut r = renderer(3, 2, RampStyle::Density);
    r.put_glyph(0, 0, 'a');
    r.put_glyph(2, 1, 'b');
    assert_eq!(r.render_to_string(), "\x1b[2J\x1b[Ha  \r\n  b\r");
}

#[test]
fn present_swaps_buffers_and_flush_writes_frame() {
    let mut r = renderer(2, 1, RampStyle::Blocks);
    r.set_pixel(0, 0, 1.0);
    let mut out = Vec::new();
    r.flush(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), format!("{CLEAR_AND_HOME}█ \r"));
    assert_eq!(r.presented_glyph_at(0, 0), Some('█'));

    r.clear();
    assert_eq!(r.glyph_at(0, 0), Some(' '));
    assert_eq!(r.presented_glyph_at(0, 0), Some('█'));
}

#[test]
fn resize_reallocates_and_clears() {
    let mut r = renderer(2, 2, RampStyle::Blocks);
    r.set_pixel(1, 1, 1.0);
    r.resize(Viewport::new(4, 1));
    assert_eq!(r.width(), 4);
    assert_eq!(r.height(), 1);
    assert_eq!(r.glyph_at(1, 1), None);
    assert_eq!(r.glyph_at(3, 0), Some(' '));
}

proptest! {
    #[test]
    fn repeated_blends_never_lighten(
        first in 0.0f64..=1.0,
        overlays in prop::collection::vec(0.0f64..=1.0, 1..12),
    ) {
        let mut r = renderer(1, 1, RampStyle::Fine);
        r.set_pixel(0, 0, first);
        let ramp = r.ramp();
        let mut last = ramp.index_of(r.glyph_at(0, 0).unwrap()).unwrap();
        for d in overlays {
            r.blend_pixel(0, 0, d);
            let now = ramp.index_of(r.glyph_at(0, 0).unwrap()).unwrap();
            prop_assert!(now >= last);
            last = now;
        }
    }
}
