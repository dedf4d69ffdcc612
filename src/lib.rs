//! Montage turns an ordered list of still images and an audio track into one video.
//!
//! Each image is fitted to the output canvas, given a slow "Ken Burns" pan or zoom, and laid
//! on a timeline where neighbours crossfade. The audio is trimmed or looped to the exact
//! timeline length and both are muxed by the system `ffmpeg`.
//!
//! - Describe the job with a [`GenerateRequest`]
//! - Run it with [`generate`] (or [`spawn_generate`] for a cancellable worker)
//! - Or drive any [`FrameSink`] yourself with [`generate_with_sink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod assets;
pub(crate) mod audio;
pub(crate) mod composition;
pub(crate) mod encode;
pub(crate) mod motion;
pub(crate) mod pipeline;
pub(crate) mod render;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{MontageError, MontageResult, Stage};

pub use crate::animation::ease::Ease;
pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::fetch::{FetchedImage, ImageFetcher, ImageSource};
pub use crate::assets::normalize::{
    NormalizedFrame, fit_dimensions, normalize_image, normalize_rgb,
};
pub use crate::audio::reconcile::{AudioPlan, reconcile, reconcile_plan};
pub use crate::audio::track::{
    AudioTrack, DECODE_SAMPLE_RATE, decode_with_ffmpeg, load_audio, load_wav, write_f32le,
};
pub use crate::composition::clip::{Clip, build_clips};
pub use crate::composition::timeline::{
    ActiveClip, ActiveClips, CROSSFADE_SECS, FADE_SECS, Timeline,
};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, OutputSpec, SinkConfig};
pub use crate::encode::stream::{encode_timeline, frame_count};
pub use crate::motion::effect::{MotionEffect, MotionTransform, choose_effect};
pub use crate::pipeline::job::{JobHandle, JobScratch, spawn_generate};
pub use crate::pipeline::orchestrator::{
    ClipSummary, GenerateReport, SkippedInput, generate, generate_with_sink, preview_frame,
};
pub use crate::pipeline::request::{GenerateRequest, PipelineConfig};
pub use crate::render::frame::{FrameRgb, render_frame_at};
