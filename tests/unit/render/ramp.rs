use super::*;
use proptest::prelude::*;

#[test]
fn endpoints_map_to_lightest_and_darkest() {
    for style in RampStyle::ALL {
        let ramp = style.ramp();
        assert!(ramp.len() >= 2, "{style} ramp too short");
        assert_eq!(ramp.glyph(ramp.quantize(0.0)), ramp.lightest());
        assert_eq!(ramp.glyph(ramp.quantize(1.0)), ramp.darkest());
    }
}

#[test]
fn quantize_rounds_and_clamps() {
    let ramp = RampStyle::Blocks.ramp();
    assert_eq!(ramp.len(), 5);
    assert_eq!(ramp.quantize(0.12), 0);
    assert_eq!(ramp.quantize(0.13), 1);
    assert_eq!(ramp.quantize(0.5), 2);
    assert_eq!(ramp.quantize(-3.0), 0);
    assert_eq!(ramp.quantize(7.0), 4);
    assert_eq!(ramp.quantize(f64::NAN), 0);
}

#[test]
fn glyphs_are_unique_within_each_ramp() {
    for style in RampStyle::ALL {
        let glyphs = style.ramp().glyphs();
        for (i, g) in glyphs.iter().enumerate() {
            assert_eq!(style.ramp().index_of(*g), Some(i), "{style}: duplicate {g:?}");
        }
    }
}

#[test]
fn style_names_round_trip_and_unknown_falls_back() {
    for style in RampStyle::ALL {
        assert_eq!(RampStyle::from_name(style.name()), Some(style));
    }
    assert_eq!(RampStyle::from_name(" BLOCKS "), Some(RampStyle::Blocks));
    assert_eq!(RampStyle::from_name("sparkles"), None);
    assert_eq!(RampStyle::from_name_or_default("sparkles"), RampStyle::Dots);
}

#[test]
fn next_cycles_through_every_style() {
    let mut style = RampStyle::Dots;
    let mut seen = Vec::new();
    for _ in 0..RampStyle::ALL.len() {
        seen.push(style);
        style = style.next();
    }
    assert_eq!(style, RampStyle::Dots);
    assert_eq!(seen, RampStyle::ALL.to_vec());
}

#[test]
fn serde_normalizes_unknown_names() {
    let style: RampStyle = serde_json::from_str("\"fine\"").unwrap();
    assert_eq!(style, RampStyle::Fine);
    let style: RampStyle = serde_json::from_str("\"nope\"").unwrap();
    assert_eq!(style, RampStyle::Dots);
    assert_eq!(serde_json::to_string(&RampStyle::Stipple).unwrap(), "\"stipple\"");
}

proptest! {
    #[test]
    fn quantize_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        for style in RampStyle::ALL {
            let ramp = style.ramp();
            prop_assert!(ramp.quantize(lo) <= ramp.quantize(hi));
        }
    }

    #[test]
    fn density_of_round_trips_through_quantize(i in 0usize..12) {
        for style in RampStyle::ALL {
            let ramp = style.ramp();
            let i = i.min(ramp.len() - 1);
            prop_assert_eq!(ramp.quantize(ramp.density_of(i)), i);
        }
    }
}
