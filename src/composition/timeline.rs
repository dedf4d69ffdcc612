//! Sequencing of clips into one continuous timeline.
//!
//! Adjacent clips overlap by a fixed crossfade window `C`. Clip `i` starts at
//! `sᵢ = Σ_{j<i}(dⱼ − C)`, so the total duration is `Σd − (N−1)·C`.

use crate::animation::ease::Ease;
use crate::composition::clip::Clip;
use crate::foundation::core::Canvas;
use crate::foundation::error::{MontageError, MontageResult};

/// Crossfade overlap applied between adjacent clips, in seconds.
///
/// This is fixed: a caller-supplied transition duration does not change it.
pub const CROSSFADE_SECS: f64 = 0.8;

/// Fade-in/fade-out window applied at clip edges, in seconds.
pub const FADE_SECS: f64 = 0.8;

/// A clip visible at a given timeline instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveClip {
    /// Index into [`Timeline::clips`].
    pub index: usize,
    /// Time since the clip's start, in seconds.
    pub local_t: f64,
    /// Crossfade blend weight in `[0, 1]`.
    pub weight: f64,
}

/// Up to two clips visible at one instant (two only inside a crossfade window).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActiveClips {
    /// A single clip fills the frame.
    One(ActiveClip),
    /// Outgoing and incoming clips during a crossfade.
    Two(ActiveClip, ActiveClip),
}

impl ActiveClips {
    /// Iterate the active clips, outgoing first.
    pub fn iter(&self) -> impl Iterator<Item = ActiveClip> {
        let (a, b) = match *self {
            Self::One(a) => (a, None),
            Self::Two(a, b) => (a, Some(b)),
        };
        std::iter::once(a).chain(b)
    }
}

/// Ordered clips with fixed crossfade overlap and fade window.
#[derive(Clone, Debug)]
pub struct Timeline {
    canvas: Canvas,
    clips: Vec<Clip>,
    starts: Vec<f64>,
    crossfade_secs: f64,
    fade_secs: f64,
    total_secs: f64,
}

impl Timeline {
    /// Lay out `clips` with `crossfade_secs` overlap and `fade_secs` edge fades.
    ///
    /// Requires at least one clip, a shared canvas, `fade_secs >= 0`,
    /// `0 <= crossfade_secs < min(dᵢ, dᵢ₊₁)` for every adjacent pair, and `dᵢ >= 2·crossfade_secs`
    /// for every clip with neighbours on both sides, so no instant shows more than two clips.
    pub fn new(clips: Vec<Clip>, crossfade_secs: f64, fade_secs: f64) -> MontageResult<Self> {
        let Some(first) = clips.first() else {
            return Err(MontageError::validation("timeline needs at least one clip"));
        };
        let canvas = first.frame().canvas();

        if !crossfade_secs.is_finite() || crossfade_secs < 0.0 {
            return Err(MontageError::validation(
                "crossfade duration must be finite and >= 0",
            ));
        }
        if !fade_secs.is_finite() || fade_secs < 0.0 {
            return Err(MontageError::validation(
                "fade duration must be finite and >= 0",
            ));
        }
        if let Some(bad) = clips.iter().position(|c| c.frame().canvas() != canvas) {
            return Err(MontageError::validation(format!(
                "clip {bad} has a different canvas than clip 0"
            )));
        }
        for (i, pair) in clips.windows(2).enumerate() {
            let shorter = pair[0].duration_secs().min(pair[1].duration_secs());
            if crossfade_secs >= shorter {
                return Err(MontageError::validation(format!(
                    "crossfade {crossfade_secs}s must be shorter than clips {i} and {} ({shorter}s)",
                    i + 1
                )));
            }
        }
        // At most two clips may overlap: clip i must end before clip i+2 starts.
        for (i, triple) in clips.windows(3).enumerate() {
            let middle = triple[1].duration_secs();
            if middle < 2.0 * crossfade_secs {
                return Err(MontageError::validation(format!(
                    "clip {} lasts {middle}s, less than two {crossfade_secs}s crossfades; \
                     clips {i} and {} would overlap",
                    i + 1,
                    i + 2
                )));
            }
        }

        let mut starts = Vec::with_capacity(clips.len());
        let mut cursor = 0.0;
        for clip in &clips {
            starts.push(cursor);
            cursor += clip.duration_secs() - crossfade_secs;
        }
        let overlaps = (clips.len() - 1) as f64;
        let total_secs =
            clips.iter().map(Clip::duration_secs).sum::<f64>() - overlaps * crossfade_secs;

        Ok(Self {
            canvas,
            clips,
            starts,
            crossfade_secs,
            fade_secs,
            total_secs,
        })
    }

    /// Output canvas shared by every clip.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Clips in display order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Start time of each clip, in seconds.
    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    /// Crossfade overlap between adjacent clips.
    pub fn crossfade_secs(&self) -> f64 {
        self.crossfade_secs
    }

    /// Fade window at clip edges.
    pub fn fade_secs(&self) -> f64 {
        self.fade_secs
    }

    /// Total rendered duration: `Σd − (N−1)·C`, or `d₀` for one clip.
    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    /// Resolve which clip(s) are visible at timeline instant `t`.
    ///
    /// `t` is clamped into `[0, total]`; the final instant resolves to the end of the last clip.
    pub fn active_at(&self, t: f64) -> ActiveClips {
        let t = if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, self.total_secs)
        };

        // Last clip whose start is <= t.
        let idx = self
            .starts
            .partition_point(|&s| s <= t)
            .saturating_sub(1);
        let current = ActiveClip {
            index: idx,
            local_t: (t - self.starts[idx]).min(self.clips[idx].duration_secs()),
            weight: 1.0,
        };

        if idx == 0 || self.crossfade_secs <= 0.0 {
            return ActiveClips::One(current);
        }

        let prev = idx - 1;
        let prev_end = self.starts[prev] + self.clips[prev].duration_secs();
        if t >= prev_end {
            return ActiveClips::One(current);
        }

        let alpha = Ease::Linear.progress(t - self.starts[idx], self.crossfade_secs);
        ActiveClips::Two(
            ActiveClip {
                index: prev,
                local_t: t - self.starts[prev],
                weight: 1.0 - alpha,
            },
            ActiveClip {
                weight: alpha,
                ..current
            },
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/timeline.rs"]
mod tests;
