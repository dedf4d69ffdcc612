//! End-to-end generation: fetch, normalize, compose, reconcile audio, encode.

use std::path::{Path, PathBuf};

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rayon::prelude::*;
use uuid::Uuid;

use crate::assets::decode::decode_image;
use crate::assets::fetch::{ImageFetcher, ImageSource};
use crate::assets::normalize::{NormalizedFrame, normalize_image};
use crate::audio::reconcile::reconcile;
use crate::audio::track::{load_audio, write_f32le};
use crate::composition::clip::build_clips;
use crate::composition::timeline::{CROSSFADE_SECS, FADE_SECS, Timeline};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInputConfig, FrameSink};
use crate::encode::stream::encode_timeline;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::Canvas;
use crate::foundation::error::{MontageError, MontageResult, Stage};
use crate::motion::effect::MotionEffect;
use crate::pipeline::job::JobScratch;
use crate::pipeline::request::{GenerateRequest, PipelineConfig};
use crate::render::frame::{FrameRgb, render_frame_at};

/// Where one clip sits in the finished video.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClipSummary {
    /// Position of the source image in the request.
    pub input_index: usize,
    /// Source reference as given by the caller.
    pub source_ref: String,
    /// Motion effect bound to the clip.
    pub effect: MotionEffect,
    /// Timeline start in seconds.
    pub start_secs: f64,
    /// Clip duration in seconds.
    pub duration_secs: f64,
}

/// An input image left out of the video.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkippedInput {
    /// Position of the source image in the request.
    pub input_index: usize,
    /// Source reference as given by the caller.
    pub source_ref: String,
    /// Stage that rejected it.
    pub stage: Stage,
    /// Why it was rejected.
    pub reason: String,
}

/// Summary of a successful run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct GenerateReport {
    /// Job identifier used in logs.
    pub job_id: Uuid,
    /// Final output path.
    pub output_path: PathBuf,
    /// Seed used for motion effect selection.
    pub seed: u64,
    /// Number of frames encoded.
    pub frames_written: u64,
    /// Encoded video duration (`frames / fps`).
    pub video_duration_secs: f64,
    /// Reconciled audio duration.
    pub audio_duration_secs: f64,
    /// Clips in display order.
    pub clips: Vec<ClipSummary>,
    /// Inputs that failed to fetch or decode.
    pub skipped: Vec<SkippedInput>,
}

/// Result of preparing one input image.
#[derive(Debug)]
enum ItemOutcome {
    Ready {
        index: usize,
        source_ref: String,
        frame: NormalizedFrame,
    },
    Skipped(SkippedInput),
}

/// Surviving inputs of the prepare stage, in request order.
#[derive(Debug, Default)]
struct Prepared {
    frames: Vec<(usize, String, NormalizedFrame)>,
    skipped: Vec<SkippedInput>,
}

/// Generate a video with `ffmpeg`, writing to `request.output_path`.
pub fn generate(request: &GenerateRequest, config: &PipelineConfig) -> MontageResult<GenerateReport> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&request.output_path));
    run_job(
        Uuid::new_v4(),
        request,
        config,
        &mut sink,
        &config.cancel_token(),
    )
}

/// Generate into an arbitrary sink. The caller owns cancellation.
pub fn generate_with_sink(
    request: &GenerateRequest,
    config: &PipelineConfig,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
) -> MontageResult<GenerateReport> {
    run_job(Uuid::new_v4(), request, config, sink, cancel)
}

/// Render the single frame at `at_secs` without touching audio or encoding.
pub fn preview_frame(
    request: &GenerateRequest,
    config: &PipelineConfig,
    at_secs: f64,
) -> MontageResult<FrameRgb> {
    let job_id = Uuid::new_v4();
    let span = tracing::info_span!("preview", %job_id);
    let _enter = span.enter();

    request.validate_visual()?;
    if !at_secs.is_finite() || at_secs < 0.0 {
        return Err(MontageError::validation(format!(
            "preview time must be finite and >= 0, got {at_secs}"
        )));
    }
    let cancel = config.cancel_token();
    let scratch = JobScratch::create(&config.scratch_root, job_id)?;
    let result = prepare_inputs(request, config, &scratch, &cancel)
        .and_then(|prepared| compose(request, prepared.frames).map(|(tl, _, _)| tl))
        .map(|timeline| render_frame_at(&timeline, at_secs));
    close_scratch(scratch);
    result
}

pub(crate) fn run_job(
    job_id: Uuid,
    request: &GenerateRequest,
    config: &PipelineConfig,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
) -> MontageResult<GenerateReport> {
    let span = tracing::info_span!("job", %job_id);
    let _enter = span.enter();
    tracing::info!(
        images = request.images.len(),
        output = %request.output_path.display(),
        "job started"
    );

    request.validate()?;
    cancel.check(Stage::Validate)?;
    if (request.transition_duration - CROSSFADE_SECS).abs() > f64::EPSILON {
        tracing::debug!(
            requested = request.transition_duration,
            used = CROSSFADE_SECS,
            "transition_duration is ignored; using the fixed crossfade"
        );
    }

    let scratch = JobScratch::create(&config.scratch_root, job_id)?;
    let result = run_stages(job_id, request, config, &scratch, sink, cancel);
    close_scratch(scratch);

    match &result {
        Ok(report) => tracing::info!(
            frames = report.frames_written,
            video_secs = report.video_duration_secs,
            skipped = report.skipped.len(),
            "job finished"
        ),
        Err(e) => tracing::error!(stage = %e.stage(), error = %e, "job failed"),
    }
    result
}

fn run_stages(
    job_id: Uuid,
    request: &GenerateRequest,
    config: &PipelineConfig,
    scratch: &JobScratch,
    sink: &mut dyn FrameSink,
    cancel: &CancelToken,
) -> MontageResult<GenerateReport> {
    let prepared = prepare_inputs(request, config, scratch, cancel)?;
    let skipped = prepared.skipped;

    cancel.check(Stage::Compose)?;
    let (timeline, clips, seed) = compose(request, prepared.frames)?;

    cancel.check(Stage::Audio)?;
    let (audio, audio_duration_secs) = prepare_audio(&request.audio_path, &timeline, scratch)?;

    cancel.check(Stage::Encode)?;
    let frames_written = encode_timeline(&timeline, &request.output, Some(audio), sink, cancel)?;

    Ok(GenerateReport {
        job_id,
        output_path: request.output_path.clone(),
        seed,
        frames_written,
        video_duration_secs: frames_written as f64 * request.output.fps.frame_duration_secs(),
        audio_duration_secs,
        clips,
        skipped,
    })
}

/// Fetch, decode and normalize every input; failures become skipped entries.
#[tracing::instrument(skip_all, fields(images = request.images.len()))]
fn prepare_inputs(
    request: &GenerateRequest,
    config: &PipelineConfig,
    scratch: &JobScratch,
    cancel: &CancelToken,
) -> MontageResult<Prepared> {
    cancel.check(Stage::Fetch)?;
    let fetcher = ImageFetcher::new(scratch.subdir("images")?, config.fetch_timeout)?;
    let canvas = request.output.canvas;

    let outcomes: Vec<MontageResult<ItemOutcome>> = if config.parallel_fetch {
        request
            .images
            .par_iter()
            .enumerate()
            .map(|(i, src)| prepare_item(&fetcher, i, src, canvas, cancel))
            .collect()
    } else {
        request
            .images
            .iter()
            .enumerate()
            .map(|(i, src)| prepare_item(&fetcher, i, src, canvas, cancel))
            .collect()
    };

    let mut prepared = Prepared::default();
    for outcome in outcomes {
        match outcome? {
            ItemOutcome::Ready {
                index,
                source_ref,
                frame,
            } => prepared.frames.push((index, source_ref, frame)),
            ItemOutcome::Skipped(s) => {
                tracing::warn!(
                    index = s.input_index,
                    source = %s.source_ref,
                    stage = %s.stage,
                    reason = %s.reason,
                    "skipping input image"
                );
                prepared.skipped.push(s);
            }
        }
    }

    if prepared.frames.is_empty() {
        return Err(MontageError::NoUsableInput {
            attempted: request.images.len(),
        });
    }
    tracing::info!(
        usable = prepared.frames.len(),
        skipped = prepared.skipped.len(),
        "inputs prepared"
    );
    Ok(prepared)
}

/// `Err` only for job-fatal conditions; per-image failures are `Ok(Skipped)`.
fn prepare_item(
    fetcher: &ImageFetcher,
    index: usize,
    source: &ImageSource,
    canvas: Canvas,
    cancel: &CancelToken,
) -> MontageResult<ItemOutcome> {
    let source_ref = source.display_ref();
    let skip = |e: MontageError, stage: Stage| {
        let reason = match e {
            MontageError::Fetch { reason, .. } | MontageError::Decode { reason, .. } => reason,
            other => other.to_string(),
        };
        ItemOutcome::Skipped(SkippedInput {
            input_index: index,
            source_ref: source_ref.clone(),
            stage,
            reason,
        })
    };

    cancel.check(Stage::Fetch)?;
    let fetched = match fetcher.fetch(index, source) {
        Ok(f) => f,
        Err(e) if e.is_recoverable() => return Ok(skip(e, Stage::Fetch)),
        Err(e) => return Err(e),
    };

    cancel.check(Stage::Decode)?;
    let decoded = match decode_image(&fetched) {
        Ok(d) => d,
        Err(e) if e.is_recoverable() => return Ok(skip(e, Stage::Decode)),
        Err(e) => return Err(e),
    };
    drop(fetched);

    match normalize_image(&decoded, canvas) {
        Ok(frame) => Ok(ItemOutcome::Ready {
            index,
            source_ref: source_ref.clone(),
            frame,
        }),
        Err(e) => Ok(skip(e, Stage::Decode)),
    }
}

/// Bind effects and lay clips out on the timeline.
#[tracing::instrument(skip_all, fields(clips = frames.len()))]
fn compose(
    request: &GenerateRequest,
    frames: Vec<(usize, String, NormalizedFrame)>,
) -> MontageResult<(Timeline, Vec<ClipSummary>, u64)> {
    let seed = request.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, seeded = request.seed.is_some(), "selecting motion effects");
    let mut rng = StdRng::seed_from_u64(seed);

    let (origins, frames): (Vec<_>, Vec<_>) = frames
        .into_iter()
        .map(|(index, source_ref, frame)| ((index, source_ref), frame))
        .unzip();
    let clips = build_clips(frames, request.duration_per_image, &mut rng)?;
    let timeline = Timeline::new(clips, CROSSFADE_SECS, FADE_SECS)?;

    let summaries = origins
        .into_iter()
        .zip(timeline.clips().iter().zip(timeline.starts()))
        .map(|((input_index, source_ref), (clip, &start_secs))| ClipSummary {
            input_index,
            source_ref,
            effect: clip.effect(),
            start_secs,
            duration_secs: clip.duration_secs(),
        })
        .collect();

    tracing::info!(total_secs = timeline.total_secs(), "timeline composed");
    Ok((timeline, summaries, seed))
}

/// Load, reconcile and stage the audio as raw PCM for the encoder.
#[tracing::instrument(skip_all, fields(audio = %audio_path.display()))]
fn prepare_audio(
    audio_path: &Path,
    timeline: &Timeline,
    scratch: &JobScratch,
) -> MontageResult<(AudioInputConfig, f64)> {
    let track = load_audio(audio_path)?;
    let reconciled = reconcile(&track, timeline.total_secs())?;
    let path = scratch.path().join("audio.f32le");
    write_f32le(&reconciled, &path)?;
    Ok((
        AudioInputConfig {
            path,
            sample_rate: reconciled.sample_rate(),
            channels: reconciled.channels(),
        },
        reconciled.duration_secs(),
    ))
}

fn close_scratch(scratch: JobScratch) {
    if let Err(e) = scratch.close() {
        tracing::warn!(error = %e, "job scratch cleanup failed");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
