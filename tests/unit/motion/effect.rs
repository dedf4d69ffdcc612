use rand::SeedableRng as _;
use rand::rngs::StdRng;

use super::*;

fn hd() -> Canvas {
    Canvas::new(1920, 1080).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn tags_round_trip_and_unknown_falls_back() {
    for e in MotionEffect::CATALOG {
        assert_eq!(MotionEffect::from_tag(e.tag()), e);
    }
    assert_eq!(MotionEffect::from_tag(" Slow_Zoom_In "), MotionEffect::SlowZoomIn);
    assert_eq!(MotionEffect::from_tag("spin"), MotionEffect::Default);
    assert!(!MotionEffect::CATALOG.contains(&MotionEffect::Default));
}

#[test]
fn serde_uses_snake_case_tags() {
    let json = serde_json::to_string(&MotionEffect::DiagonalDrift1).unwrap();
    assert_eq!(json, r#""diagonal_drift_1""#);
    let e: MotionEffect = serde_json::from_str(r#""zoom_and_pan_up""#).unwrap();
    assert_eq!(e, MotionEffect::ZoomAndPanUp);
    let e: MotionEffect = serde_json::from_str(r#""wobble""#).unwrap();
    assert_eq!(e, MotionEffect::Default);
}

#[test]
fn endpoints_match_catalog_table() {
    let c = hd();
    let d = 2.0;
    let end = |e: MotionEffect| e.evaluate(d, d, c);
    let start = |e: MotionEffect| e.evaluate(0.0, d, c);

    let t = end(MotionEffect::ZoomAndPanRight);
    assert!(approx(t.scale, 1.15) && approx(t.dx, -192.0) && approx(t.dy, 0.0));
    let t = end(MotionEffect::ZoomAndPanLeft);
    assert!(approx(t.scale, 1.15) && approx(t.dx, 192.0));
    let t = end(MotionEffect::ZoomAndPanDown);
    assert!(approx(t.dx, 0.0) && approx(t.dy, -108.0));
    let t = end(MotionEffect::ZoomAndPanUp);
    assert!(approx(t.dy, 108.0));
    assert!(approx(end(MotionEffect::SlowZoomIn).scale, 1.20));
    assert!(approx(start(MotionEffect::SlowZoomOut).scale, 1.20));
    assert!(approx(end(MotionEffect::SlowZoomOut).scale, 1.0));
    let t = end(MotionEffect::DiagonalDrift1);
    assert!(approx(t.scale, 1.15) && approx(t.dx, -144.0) && approx(t.dy, -81.0));
    let t = end(MotionEffect::DiagonalDrift2);
    assert!(approx(t.dx, 144.0) && approx(t.dy, -81.0));
    assert!(approx(end(MotionEffect::Default).scale, 1.10));

    for e in MotionEffect::CATALOG {
        let s = start(e);
        assert!(approx(s.dx, 0.0) && approx(s.dy, 0.0), "{e} starts displaced");
    }
}

#[test]
fn evaluation_uses_smoothstep_and_clamps() {
    let c = hd();
    let mid = MotionEffect::SlowZoomIn.evaluate(0.5, 2.0, c);
    // u = 0.25 -> ease = 0.15625
    assert!(approx(mid.scale, 1.0 + 0.2 * 0.15625));

    let past = MotionEffect::SlowZoomIn.evaluate(9.0, 2.0, c);
    assert!(approx(past.scale, 1.2));
    let before = MotionEffect::SlowZoomIn.evaluate(-1.0, 2.0, c);
    assert!(approx(before.scale, 1.0));
}

#[test]
fn evaluation_is_pure() {
    let c = hd();
    for e in MotionEffect::CATALOG {
        assert_eq!(e.evaluate(0.7, 2.0, c), e.evaluate(0.7, 2.0, c));
    }
}

#[test]
fn affine_scales_about_center_then_displaces() {
    let c = Canvas::new(100, 50).unwrap();
    let t = MotionTransform {
        scale: 2.0,
        dx: 5.0,
        dy: -3.0,
    };
    let a = t.to_affine(c);
    let center = a * kurbo::Point::new(50.0, 25.0);
    assert!(approx(center.x, 55.0) && approx(center.y, 22.0));
    let corner = a * kurbo::Point::new(0.0, 0.0);
    assert!(approx(corner.x, -45.0) && approx(corner.y, -28.0));

    let id = MotionTransform::IDENTITY.to_affine(c);
    assert_eq!(id * kurbo::Point::new(3.0, 4.0), kurbo::Point::new(3.0, 4.0));
}

#[test]
fn seeded_selection_is_reproducible_and_covers_catalog() {
    let mut a = StdRng::seed_from_u64(42);
    let mut b = StdRng::seed_from_u64(42);
    let seq_a: Vec<_> = (0..64).map(|_| choose_effect(&mut a)).collect();
    let seq_b: Vec<_> = (0..64).map(|_| choose_effect(&mut b)).collect();
    assert_eq!(seq_a, seq_b);

    let mut rng = StdRng::seed_from_u64(7);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..2000 {
        let e = choose_effect(&mut rng);
        assert_ne!(e, MotionEffect::Default);
        seen.insert(e);
    }
    assert_eq!(seen.len(), MotionEffect::CATALOG.len());
}
