use crate::composition::timeline::Timeline;
use crate::encode::sink::{AudioInputConfig, FrameSink, OutputSpec, SinkConfig};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{MontageError, MontageResult, Stage};
use crate::render::frame::render_frame_at;

/// Number of frames sampled for `timeline` at `fps`: `ceil(total · fps)`.
pub fn frame_count(timeline: &Timeline, fps: Fps) -> u64 {
    fps.secs_to_frames_ceil(timeline.total_secs())
}

/// Render every frame of `timeline` into `sink` and finalize it.
///
/// Frame `i` is sampled at `i / fps`. On any failure, including cancellation, the sink is
/// aborted so no partial output survives. Returns the number of frames written.
#[tracing::instrument(skip_all, fields(frames = tracing::field::Empty))]
pub fn encode_timeline(
    timeline: &Timeline,
    output: &OutputSpec,
    audio: Option<AudioInputConfig>,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
) -> MontageResult<u64> {
    output.validate()?;
    if timeline.canvas() != output.canvas {
        return Err(MontageError::validation(format!(
            "timeline canvas {}x{} does not match output {}x{}",
            timeline.canvas().width,
            timeline.canvas().height,
            output.canvas.width,
            output.canvas.height
        )));
    }

    let n = frame_count(timeline, output.fps);
    tracing::Span::current().record("frames", n);
    cancel.check(Stage::Encode)?;

    sink.begin(SinkConfig {
        output: output.clone(),
        audio,
    })?;
    match push_all(timeline, output.fps, n, sink, cancel).and_then(|()| sink.end()) {
        Ok(()) => {
            tracing::info!(
                frames = n,
                video_secs = n as f64 * output.fps.frame_duration_secs(),
                "encoded timeline"
            );
            Ok(n)
        }
        Err(e) => {
            tracing::warn!(error = %e, "encoding failed; discarding partial output");
            sink.abort();
            Err(e)
        }
    }
}

fn push_all(
    timeline: &Timeline,
    fps: Fps,
    n: u64,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
) -> MontageResult<()> {
    let log_every = u64::from(fps.num / fps.den.max(1)).max(1) * 5;
    for i in 0..n {
        cancel.check(Stage::Encode)?;
        let idx = FrameIndex(i);
        let frame = render_frame_at(timeline, fps.frame_time_secs(idx));
        sink.push_frame(idx, &frame)?;
        if (i + 1) % log_every == 0 {
            tracing::debug!(done = i + 1, total = n, "encode progress");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/stream.rs"]
mod tests;
