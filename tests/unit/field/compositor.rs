use super::*;
use crate::render::ramp::RampStyle;
use proptest::prelude::*;

#[test]
fn default_weights_sum_to_one_and_favor_foreground() {
    let clouds = CloudCompositor::new(Viewport::new(40, 10));
    let w = clouds.weights();
    assert_eq!(w.len(), 3);
    assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(w[0] < w[1] && w[1] < w[2]);
    let speeds: Vec<f64> = clouds.layers().iter().map(|l| l.params().speed).collect();
    assert!(speeds[0] < speeds[1] && speeds[1] < speeds[2]);
}

#[test]
fn with_layers_validates_weights() {
    let vp = Viewport::new(10, 10);
    assert!(CloudCompositor::with_layers(vp, vec![]).is_err());
    assert!(CloudCompositor::with_layers(vp, vec![(LayerParams::default(), 0.5)]).is_err());
    assert!(
        CloudCompositor::with_layers(
            vp,
            vec![(LayerParams::default(), -0.5), (LayerParams::default(), 1.5)]
        )
        .is_err()
    );
    let ok = CloudCompositor::with_layers(vp, vec![(LayerParams::default(), 1.0)]).unwrap();
    assert_eq!(ok.layers().len(), 1);
}

#[test]
fn advance_reaches_every_layer_at_its_own_speed() {
    let mut clouds = CloudCompositor::new(Viewport::new(40, 10));
    clouds.advance(2.0);
    for layer in clouds.layers() {
        assert!((layer.phase().0 - 2.0 * layer.params().speed).abs() < 1e-12);
    }
}

#[test]
fn render_into_fills_the_whole_grid() {
    let clouds = CloudCompositor::new(Viewport::new(16, 6));
    let mut r = GlyphRenderer::new(Viewport::new(16, 6), RampStyle::Density);
    for x in 0..16 {
        r.put_glyph(x, 0, 'X');
    }
    clouds.render_into(&mut r);
    let ramp = r.ramp();
    for y in 0..6 {
        for x in 0..16 {
            let g = r.glyph_at(x, y).unwrap();
            assert!(ramp.index_of(g).is_some(), "cell ({x},{y}) holds {g:?}");
            let expected = ramp.glyph(ramp.quantize(clouds.combined_density(x as f64, y as f64)));
            assert_eq!(g, expected);
        }
    }
}

#[test]
fn resize_mid_animation_preserves_layer_state() {
    let mut clouds = CloudCompositor::new(Viewport::new(40, 10));
    clouds.update(1.75);
    let before = clouds.combined_density(7.0, 3.0);
    let phases: Vec<_> = clouds.layers().iter().map(|l| l.phase()).collect();

    StreamSource::resize(&mut clouds, Viewport::new(120, 40));

    assert_eq!(clouds.viewport(), Viewport::new(120, 40));
    let after: Vec<_> = clouds.layers().iter().map(|l| l.phase()).collect();
    assert_eq!(phases, after);
    assert_eq!(clouds.combined_density(7.0, 3.0), before);
    for layer in clouds.layers() {
        assert_eq!(layer.viewport(), Viewport::new(120, 40));
    }

    // Only elapsed time moves the texture afterwards.
    clouds.update(0.5);
    for (layer, (px, _)) in clouds.layers().iter().zip(phases) {
        assert!((layer.phase().0 - (px + 0.5 * layer.params().speed)).abs() < 1e-12);
    }
}

proptest! {
    #[test]
    fn combined_density_is_bounded(
        x in -1.0e4f64..1.0e4,
        y in -1.0e4f64..1.0e4,
        elapsed in 0.0f64..1.0e3,
    ) {
        let mut clouds = CloudCompositor::new(Viewport::new(80, 24));
        clouds.advance(elapsed);
        let d = clouds.combined_density(x, y);
        prop_assert!((0.0..=1.0).contains(&d));
    }
}
