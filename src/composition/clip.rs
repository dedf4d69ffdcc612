use rand::Rng;

use crate::assets::normalize::NormalizedFrame;
use crate::foundation::error::{MontageError, MontageResult};
use crate::motion::effect::{MotionEffect, MotionTransform, choose_effect};

/// One normalized image bound to a motion effect and a display duration.
#[derive(Clone, Debug)]
pub struct Clip {
    frame: NormalizedFrame,
    effect: MotionEffect,
    duration_secs: f64,
    fade_in: bool,
    fade_out: bool,
}

impl Clip {
    /// Build a clip; `duration_secs` must be finite and positive.
    pub fn new(
        frame: NormalizedFrame,
        effect: MotionEffect,
        duration_secs: f64,
        fade_in: bool,
        fade_out: bool,
    ) -> MontageResult<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(MontageError::validation(format!(
                "clip duration must be finite and > 0, got {duration_secs}"
            )));
        }
        Ok(Self {
            frame,
            effect,
            duration_secs,
            fade_in,
            fade_out,
        })
    }

    /// Source pixels.
    pub fn frame(&self) -> &NormalizedFrame {
        &self.frame
    }

    /// Motion effect applied over the clip's lifetime.
    pub fn effect(&self) -> MotionEffect {
        self.effect
    }

    /// Display duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Whether the clip fades in from black.
    pub fn fade_in(&self) -> bool {
        self.fade_in
    }

    /// Whether the clip fades out to black.
    pub fn fade_out(&self) -> bool {
        self.fade_out
    }

    /// Motion transform at clip-local time `local_t`.
    pub fn transform_at(&self, local_t: f64) -> MotionTransform {
        self.effect
            .evaluate(local_t, self.duration_secs, self.frame.canvas())
    }

    /// Brightness multiplier from the fade-in/fade-out ramps at `local_t`.
    ///
    /// `fade_secs <= 0` disables fading.
    pub fn fade_factor(&self, local_t: f64, fade_secs: f64) -> f64 {
        if fade_secs <= 0.0 {
            return 1.0;
        }
        let mut gain = 1.0;
        if self.fade_in {
            gain *= (local_t / fade_secs).clamp(0.0, 1.0);
        }
        if self.fade_out {
            gain *= ((self.duration_secs - local_t) / fade_secs).clamp(0.0, 1.0);
        }
        gain
    }
}

/// Bind each frame to an effect drawn from `rng`, in input order.
///
/// The first clip fades in; every clip fades out, including clips followed by a crossfade.
pub fn build_clips<R: Rng + ?Sized>(
    frames: Vec<NormalizedFrame>,
    duration_secs: f64,
    rng: &mut R,
) -> MontageResult<Vec<Clip>> {
    frames
        .into_iter()
        .enumerate()
        .map(|(i, frame)| {
            let effect = choose_effect(rng);
            tracing::debug!(clip = i, effect = %effect, "assigned motion effect");
            Clip::new(frame, effect, duration_secs, i == 0, true)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/composition/clip.rs"]
mod tests;
