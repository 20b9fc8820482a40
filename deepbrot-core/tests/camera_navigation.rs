use deepbrot_core::{Camera, Regime};

fn default_camera() -> Camera {
    Camera::new(800, 600, 64).unwrap()
}

#[test]
fn zoom_then_inverse_zoom_restores_the_view() {
    let camera = default_camera();
    let zoomed = camera.zoom_at(200, 150, 0.8).unwrap();
    let restored = zoomed.zoom_at(200, 150, 1.25).unwrap();

    // 0.8 is not dyadic, so a rounding residue at the f64 level is allowed.
    let before = camera.approx();
    let after = restored.approx();
    assert!((after.center_x - before.center_x).abs() < 1e-12);
    assert!((after.center_y - before.center_y).abs() < 1e-12);
    assert!((after.scale / before.scale - 1.0).abs() < 1e-12);
}

#[test]
fn dyadic_zoom_roundtrip_is_exact() {
    let camera = default_camera();
    let restored = camera
        .zoom_at(123, 456, 0.5)
        .unwrap()
        .zoom_at(123, 456, 2.0)
        .unwrap();
    assert_eq!(restored.center().0, camera.center().0);
    assert_eq!(restored.center().1, camera.center().1);
    assert_eq!(restored.scale(), camera.scale());
}

#[test]
fn pan_roundtrip_is_exact() {
    let camera = default_camera();
    let moved = camera.pan(37, -12);
    let back = moved.pan(-37, 12);
    assert_eq!(back.center().0, camera.center().0);
    assert_eq!(back.center().1, camera.center().1);
}

#[test]
fn precision_escalates_after_deep_magnification() {
    // 512 bits, then 2^600 worth of magnification in one step.
    let camera = default_camera().with_precision(512).unwrap();
    let factor = 2f64.powi(-600);
    let deep = camera.zoom_at(400, 300, factor).unwrap().ensure_precision();
    assert!(
        deep.precision_bits() >= 1024,
        "expected at least 1024 bits, got {}",
        deep.precision_bits()
    );
}

#[test]
fn deep_zoom_flips_the_regime_and_pan_still_works() {
    let factor = 2f64.powi(-600);
    let mut camera = default_camera();
    for _ in 0..2 {
        camera = camera.zoom_at(400, 300, factor).unwrap().ensure_precision();
    }
    assert_eq!(camera.regime(), Regime::Deep);
    assert!(camera.magnification_log2() > 1100.0);

    // A one-pixel pan at this depth is far below f64 resolution but must
    // still move the center.
    let panned = camera.pan(1, 0);
    assert_ne!(panned.center().0, camera.center().0);
    assert_eq!(panned.center().1, camera.center().1);
}

#[test]
fn fixed_snapshot_covers_the_canvas_consistently() {
    let camera = default_camera().with_precision(128).unwrap();
    let frame = camera.fixed_snapshot().unwrap();
    assert_eq!(frame.bits, 128);

    // Center pixel maps back to the camera center.
    let half_w = dashu::integer::IBig::from(400);
    let center_x = &frame.origin_x + half_w * &frame.scale;
    let expected = camera.center().0.to_fixed_point(128);
    assert_eq!(center_x, expected);
}

#[test]
fn reset_returns_to_the_canonical_view() {
    let camera = default_camera()
        .zoom_at(10, 20, 0.25)
        .unwrap()
        .pan(100, 100)
        .reset()
        .unwrap();
    let fresh = default_camera();
    assert_eq!(camera.center().0, fresh.center().0);
    assert_eq!(camera.center().1, fresh.center().1);
    assert_eq!(camera.scale(), fresh.scale());
}
