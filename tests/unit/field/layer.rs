use super::*;
use proptest::prelude::*;

fn field(seed: u32) -> DensityField {
    DensityField::new(
        Viewport::new(80, 24),
        LayerParams {
            speed: 0.6,
            scale: 0.06,
            octaves: 4,
            persistence: 0.55,
            lacunarity: 2.0,
            seed,
        },
    )
}

#[test]
fn contrast_curve_is_symmetric_and_fixes_endpoints() {
    assert_eq!(apply_contrast(0.0, CONTRAST_POWER), 0.0);
    assert_eq!(apply_contrast(0.5, CONTRAST_POWER), 0.5);
    assert_eq!(apply_contrast(1.0, CONTRAST_POWER), 1.0);
    let lo = apply_contrast(0.25, CONTRAST_POWER);
    let hi = apply_contrast(0.75, CONTRAST_POWER);
    assert!(lo < 0.25);
    assert!(hi > 0.75);
    assert!((lo + hi - 1.0).abs() < 1e-12);
}

#[test]
fn advance_moves_only_the_horizontal_phase() {
    let mut f = field(7);
    f.advance(2.0);
    f.advance(0.5);
    let (px, py) = f.phase();
    assert!((px - 1.5).abs() < 1e-12);
    assert_eq!(py, 0.0);

    f.advance(-1.0);
    f.advance(f64::NAN);
    assert!((f.phase().0 - 1.5).abs() < 1e-12);
}

#[test]
fn advancing_is_a_horizontal_shift_of_the_texture() {
    let mut f = field(11);
    let ahead = f.sample(13.0, 5.0);
    f.advance(10.0 / 0.6);
    assert!((f.sample(3.0, 5.0) - ahead).abs() < 1e-9);
}

#[test]
fn resize_keeps_seed_and_phase() {
    let mut f = field(99);
    f.advance(3.25);
    let before = f.sample(4.0, 2.0);
    let phase = f.phase();
    f.resize(Viewport::new(200, 60));
    assert_eq!(f.viewport(), Viewport::new(200, 60));
    assert_eq!(f.phase(), phase);
    assert_eq!(f.params().seed, 99);
    assert_eq!(f.sample(4.0, 2.0), before);
}

#[test]
fn different_seeds_produce_different_textures() {
    let a = field(1);
    let b = field(2);
    let differs = (0..20).any(|i| a.sample(i as f64 * 1.7, 3.0) != b.sample(i as f64 * 1.7, 3.0));
    assert!(differs);
}

#[test]
fn non_finite_coordinates_stay_in_range() {
    let f = field(5);
    for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let d = f.sample(v, v);
        assert!((0.0..=1.0).contains(&d));
    }
}

proptest! {
    #[test]
    fn sample_is_bounded(
        seed in any::<u32>(),
        x in -1.0e6f64..1.0e6,
        y in -1.0e6f64..1.0e6,
        elapsed in 0.0f64..1.0e4,
    ) {
        let mut f = field(seed);
        f.advance(elapsed);
        let d = f.sample(x, y);
        prop_assert!((0.0..=1.0).contains(&d), "sample {d} out of range");
    }

    #[test]
    fn sample_is_deterministic(
        seed in any::<u32>(),
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        elapsed in 0.0f64..100.0,
    ) {
        let mut a = field(seed);
        let mut b = field(seed);
        a.advance(elapsed);
        b.advance(elapsed);
        prop_assert_eq!(a.sample(x, y), a.sample(x, y));
        prop_assert_eq!(a.sample(x, y), b.sample(x, y));
    }
}
