//! Caller-facing request and configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::fetch::ImageSource;
use crate::composition::timeline::CROSSFADE_SECS;
use crate::encode::sink::OutputSpec;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{MontageError, MontageResult};

fn default_duration_per_image() -> f64 {
    2.0
}

fn default_transition_duration() -> f64 {
    0.5
}

/// One video generation request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerateRequest {
    /// Source images in display order.
    pub images: Vec<ImageSource>,
    /// Audio track to reconcile to the video length.
    pub audio_path: PathBuf,
    /// Where the muxed output is written.
    pub output_path: PathBuf,
    /// Seconds each image is displayed, including its crossfade overlap.
    #[serde(default = "default_duration_per_image")]
    pub duration_per_image: f64,
    /// Accepted for compatibility; the crossfade window is fixed at
    /// [`CROSSFADE_SECS`](crate::CROSSFADE_SECS).
    #[serde(default = "default_transition_duration")]
    pub transition_duration: f64,
    /// Encoded output settings.
    #[serde(default)]
    pub output: OutputSpec,
    /// Seed for motion effect selection. `None` draws one from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerateRequest {
    /// Request with default timing and output settings.
    pub fn new(
        images: impl IntoIterator<Item = impl Into<ImageSource>>,
        audio_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images: images.into_iter().map(Into::into).collect(),
            audio_path: audio_path.into(),
            output_path: output_path.into(),
            duration_per_image: default_duration_per_image(),
            transition_duration: default_transition_duration(),
            output: OutputSpec::default(),
            seed: None,
        }
    }

    /// Load a request from a JSON file.
    pub fn from_json_path(path: &Path) -> MontageResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MontageError::validation(format!("failed to read request '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            MontageError::validation(format!("invalid request '{}': {e}", path.display()))
        })
    }

    /// Check everything needed to build the visual timeline.
    pub fn validate_visual(&self) -> MontageResult<()> {
        if self.images.is_empty() {
            return Err(MontageError::validation("at least one image is required"));
        }
        let d = self.duration_per_image;
        if !d.is_finite() || d <= 0.0 {
            return Err(MontageError::validation(format!(
                "duration_per_image must be finite and > 0, got {d}"
            )));
        }
        if self.images.len() > 1 && d <= CROSSFADE_SECS {
            return Err(MontageError::validation(format!(
                "duration_per_image {d} must exceed the {CROSSFADE_SECS} s crossfade"
            )));
        }
        if self.images.len() > 2 && d < 2.0 * CROSSFADE_SECS {
            return Err(MontageError::validation(format!(
                "duration_per_image {d} must be at least {} with more than two images",
                2.0 * CROSSFADE_SECS
            )));
        }
        let td = self.transition_duration;
        if !td.is_finite() || td < 0.0 {
            return Err(MontageError::validation(format!(
                "transition_duration must be finite and >= 0, got {td}"
            )));
        }
        self.output.validate()
    }

    /// Check the whole request.
    pub fn validate(&self) -> MontageResult<()> {
        self.validate_visual()?;
        if self.audio_path.as_os_str().is_empty() {
            return Err(MontageError::validation("audio_path must not be empty"));
        }
        if self.output_path.file_name().is_none() {
            return Err(MontageError::validation(format!(
                "output_path '{}' has no file name",
                self.output_path.display()
            )));
        }
        Ok(())
    }
}

/// Per-process pipeline settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory under which each job creates its private scratch directory.
    pub scratch_root: PathBuf,
    /// Timeout for a single remote image download.
    pub fetch_timeout: Duration,
    /// Wall-clock limit for a whole job. `None` disables it.
    pub job_timeout: Option<Duration>,
    /// Fetch, decode and normalize images concurrently.
    pub parallel_fetch: bool,
}

impl PipelineConfig {
    /// Fresh cancellation token honoring [`PipelineConfig::job_timeout`].
    pub fn cancel_token(&self) -> CancelToken {
        match self.job_timeout {
            Some(t) => CancelToken::with_timeout(t),
            None => CancelToken::new(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            fetch_timeout: Duration::from_secs(30),
            job_timeout: None,
            parallel_fetch: true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/request.rs"]
mod tests;
