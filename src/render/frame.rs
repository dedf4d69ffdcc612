use crate::composition::timeline::Timeline;
use crate::foundation::core::Canvas;
use crate::foundation::math::quantize_u8;
use crate::render::sample::accumulate_transformed;

/// A rendered frame as opaque RGB8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGB8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRgb {
    /// An all-black frame.
    pub fn black(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgb8_len()],
        }
    }

    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Render the timeline at instant `t` seconds.
///
/// Active clips are transformed by their motion effect, scaled by fade and crossfade weights,
/// and summed over black.
pub fn render_frame_at(timeline: &Timeline, t: f64) -> FrameRgb {
    let canvas = timeline.canvas();
    let mut acc = vec![0.0f32; canvas.rgb8_len()];

    for active in timeline.active_at(t).iter() {
        let clip = &timeline.clips()[active.index];
        let fade = clip.fade_factor(active.local_t, timeline.fade_secs());
        let gain = (active.weight * fade) as f32;
        if gain <= 0.0 {
            continue;
        }
        let affine = clip.transform_at(active.local_t).to_affine(canvas);
        accumulate_transformed(&mut acc, clip.frame(), affine, gain);
    }

    FrameRgb {
        width: canvas.width,
        height: canvas.height,
        data: acc.into_iter().map(quantize_u8).collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
