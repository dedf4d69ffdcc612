//! Trim or loop an audio track to an exact target duration.

use crate::audio::track::AudioTrack;
use crate::foundation::error::{MontageError, MontageResult};

/// How a track is brought to its target length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioPlan {
    /// Source already has exactly the target number of sample frames.
    Exact,
    /// Source is longer; keep its prefix.
    Trim,
    /// Source is shorter; repeat it `loops` times, then trim.
    Loop {
        /// `ceil(target / source)` copies.
        loops: u64,
    },
}

/// Decide how `track` reaches `target_frames` sample frames.
pub fn reconcile_plan(track: &AudioTrack, target_frames: u64) -> MontageResult<AudioPlan> {
    let src = track.frames();
    if src == target_frames {
        return Ok(AudioPlan::Exact);
    }
    if src > target_frames {
        return Ok(AudioPlan::Trim);
    }
    if src == 0 {
        return Err(MontageError::audio("cannot loop an empty audio track"));
    }
    Ok(AudioPlan::Loop {
        loops: target_frames.div_ceil(src),
    })
}

/// Return a new track exactly `target_secs` long.
///
/// The target is rounded to whole sample frames. The result's prefix of
/// `min(source, target)` equals the source bit-for-bit; the source is untouched.
#[tracing::instrument(skip(track), fields(source_secs = track.duration_secs()))]
pub fn reconcile(track: &AudioTrack, target_secs: f64) -> MontageResult<AudioTrack> {
    if !target_secs.is_finite() || target_secs <= 0.0 {
        return Err(MontageError::audio(format!(
            "audio target duration must be finite and > 0, got {target_secs}"
        )));
    }
    let target_frames = track.secs_to_frames(target_secs);
    let plan = reconcile_plan(track, target_frames)?;
    tracing::info!(?plan, target_frames, "reconciling audio");

    let ch = usize::from(track.channels());
    let target_len = usize::try_from(target_frames)
        .ok()
        .and_then(|f| f.checked_mul(ch))
        .ok_or_else(|| MontageError::audio("audio target length overflows memory"))?;

    let samples: Vec<f32> = match plan {
        AudioPlan::Exact => return Ok(track.clone()),
        AudioPlan::Trim => track.samples()[..target_len].to_vec(),
        AudioPlan::Loop { .. } => track
            .samples()
            .iter()
            .copied()
            .cycle()
            .take(target_len)
            .collect(),
    };
    AudioTrack::new(track.sample_rate(), track.channels(), samples)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/reconcile.rs"]
mod tests;
