use kurbo::{Affine, Point};
use rayon::prelude::*;

use crate::assets::normalize::NormalizedFrame;

/// Bilinear sample at source pixel coordinates `(sx, sy)` (pixel centers on integers).
///
/// Taps outside the frame read as black.
pub(crate) fn sample_bilinear(src: &NormalizedFrame, sx: f64, sy: f64) -> [f32; 3] {
    let canvas = src.canvas();
    let (w, h) = (i64::from(canvas.width), i64::from(canvas.height));
    let data = src.as_raw();

    let x0f = sx.floor();
    let y0f = sy.floor();
    let fx = (sx - x0f) as f32;
    let fy = (sy - y0f) as f32;
    let (x0, y0) = (x0f as i64, y0f as i64);

    let tap = |x: i64, y: i64| -> [f32; 3] {
        if x < 0 || y < 0 || x >= w || y >= h {
            return [0.0; 3];
        }
        let i = ((y * w + x) * 3) as usize;
        [
            f32::from(data[i]),
            f32::from(data[i + 1]),
            f32::from(data[i + 2]),
        ]
    };

    if fx == 0.0 && fy == 0.0 {
        return tap(x0, y0);
    }

    let p00 = tap(x0, y0);
    let p10 = tap(x0 + 1, y0);
    let p01 = tap(x0, y0 + 1);
    let p11 = tap(x0 + 1, y0 + 1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}

/// Accumulate `gain · src` transformed by `to_canvas` into a linear RGB accumulator.
///
/// `acc` is row-major `f32` RGB at the source canvas size. Each output pixel center is mapped back
/// through the inverse transform and sampled bilinearly.
pub(crate) fn accumulate_transformed(
    acc: &mut [f32],
    src: &NormalizedFrame,
    to_canvas: Affine,
    gain: f32,
) {
    let canvas = src.canvas();
    let row_len = canvas.width as usize * 3;
    debug_assert_eq!(acc.len(), canvas.rgb8_len());
    if gain <= 0.0 || row_len == 0 {
        return;
    }

    let inv = to_canvas.inverse();
    acc.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let cy = y as f64 + 0.5;
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                let p = inv * Point::new(x as f64 + 0.5, cy);
                let s = sample_bilinear(src, p.x - 0.5, p.y - 0.5);
                px[0] += s[0] * gain;
                px[1] += s[1] * gain;
                px[2] += s[2] * gain;
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/render/sample.rs"]
mod tests;
