use super::*;
use crate::assets::normalize::NormalizedFrame;
use crate::composition::clip::Clip;
use crate::motion::effect::MotionEffect;

fn canvas() -> Canvas {
    Canvas::new(8, 6).unwrap()
}

fn solid_clip(rgb: [u8; 3], d: f64, fade_in: bool, fade_out: bool) -> Clip {
    // Slow zoom keeps the whole canvas covered, so solid clips stay solid.
    Clip::new(
        NormalizedFrame::solid(canvas(), rgb),
        MotionEffect::SlowZoomIn,
        d,
        fade_in,
        fade_out,
    )
    .unwrap()
}

#[test]
fn first_frame_of_fading_clip_is_black() {
    let tl = Timeline::new(vec![solid_clip([200, 200, 200], 2.0, true, true)], 0.8, 0.8).unwrap();
    let f = render_frame_at(&tl, 0.0);
    assert_eq!((f.width, f.height), (8, 6));
    assert!(f.data.iter().all(|&b| b == 0));
}

#[test]
fn mid_clip_is_full_brightness() {
    let tl = Timeline::new(vec![solid_clip([200, 100, 50], 2.0, true, true)], 0.8, 0.8).unwrap();
    let f = render_frame_at(&tl, 1.0);
    assert_eq!(f.pixel(4, 3), [200, 100, 50]);
    assert_eq!(f.pixel(0, 0), [200, 100, 50]);
}

#[test]
fn crossfade_blends_with_fade_dip() {
    let a = solid_clip([200, 0, 0], 2.0, false, true);
    let b = solid_clip([0, 0, 200], 2.0, false, true);
    let tl = Timeline::new(vec![a, b], 0.8, 0.8).unwrap();

    // t = 1.6: outgoing weight 0.5, fade-out 0.5; incoming weight 0.5, no fade yet.
    let f = render_frame_at(&tl, 1.6);
    assert_eq!(f.pixel(4, 3), [50, 0, 100]);
}

#[test]
fn without_fades_crossfade_midpoint_is_even_mix() {
    let a = solid_clip([200, 0, 0], 2.0, false, false);
    let b = solid_clip([0, 0, 200], 2.0, false, false);
    let tl = Timeline::new(vec![a, b], 0.8, 0.8).unwrap();
    let f = render_frame_at(&tl, 1.6);
    assert_eq!(f.pixel(4, 3), [100, 0, 100]);
}

#[test]
fn zoom_effect_changes_interior_pixels() {
    let mut img = image::RgbImage::new(8, 6);
    for (x, _, p) in img.enumerate_pixels_mut() {
        *p = image::Rgb([(x * 30) as u8, 0, 0]);
    }
    let frame = NormalizedFrame::from_rgb(canvas(), img).unwrap();
    let clip = Clip::new(frame, MotionEffect::SlowZoomIn, 2.0, false, false).unwrap();
    let tl = Timeline::new(vec![clip], 0.8, 0.8).unwrap();

    let start = render_frame_at(&tl, 0.0);
    let end = render_frame_at(&tl, 2.0);
    assert_eq!(start.pixel(0, 0), [0, 0, 0]);
    assert_eq!(start.pixel(7, 0), [210, 0, 0]);
    // Zoomed 1.2x about the center: the rightmost column now shows interior content.
    assert!(end.pixel(7, 0)[0] < 210);
    assert!(end.pixel(0, 0)[0] > 0);
}

#[test]
fn rendering_is_deterministic() {
    let tl = Timeline::new(
        vec![
            solid_clip([10, 20, 30], 2.0, true, true),
            solid_clip([90, 80, 70], 2.0, false, true),
        ],
        0.8,
        0.8,
    )
    .unwrap();
    assert_eq!(render_frame_at(&tl, 1.37), render_frame_at(&tl, 1.37));
}
