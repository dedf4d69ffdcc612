/// Convenience result type used across montage.
pub type MontageResult<T> = Result<T, MontageError>;

/// Pipeline stage that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Request/configuration validation.
    Validate,
    /// Fetching source image bytes.
    Fetch,
    /// Decoding and normalizing source images.
    Decode,
    /// Building clips and the timeline.
    Compose,
    /// Loading or reconciling the audio track.
    Audio,
    /// Rendering frames and muxing the output container.
    Encode,
    /// Removing temporary artifacts.
    Cleanup,
    /// No stage could be attributed, e.g. a job worker panicked.
    Unknown,
}

impl Stage {
    /// Stable lowercase stage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Compose => "compose",
            Self::Audio => "audio",
            Self::Encode => "encode",
            Self::Cleanup => "cleanup",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error taxonomy used by pipeline APIs.
///
/// `Fetch` and `Decode` are per-image and recoverable: the orchestrator skips the image. Every
/// other variant aborts a generation run.
#[derive(thiserror::Error, Debug)]
pub enum MontageError {
    /// A source image could not be fetched.
    #[error("fetch error for '{source_ref}': {reason}")]
    Fetch {
        /// Source reference as given by the caller.
        source_ref: String,
        /// Underlying cause.
        reason: String,
    },

    /// A source image was fetched but could not be decoded.
    #[error("decode error for '{source_ref}': {reason}")]
    Decode {
        /// Source reference as given by the caller.
        source_ref: String,
        /// Underlying cause.
        reason: String,
    },

    /// Every source image failed to fetch or decode.
    #[error("no usable input: all {attempted} image(s) failed to fetch or decode")]
    NoUsableInput {
        /// Number of images that were attempted.
        attempted: usize,
    },

    /// The audio track could not be loaded or reconciled.
    #[error("audio load error: {0}")]
    AudioLoad(String),

    /// Rendering or muxing failed; partial output has been discarded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Temporary artifacts could not be removed. Logged, never returned from a run.
    #[error("cleanup error: {0}")]
    Cleanup(String),

    /// Invalid request or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The run was cancelled or exceeded its deadline.
    #[error("cancelled during {stage} stage")]
    Cancelled {
        /// Stage that observed the cancellation.
        stage: Stage,
    },

    /// A job worker thread panicked before producing a result.
    #[error("job {job_id} worker panicked: {message}")]
    WorkerPanicked {
        /// Job whose worker died.
        job_id: String,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl MontageError {
    /// Build a [`MontageError::Fetch`] value.
    pub fn fetch(source_ref: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`MontageError::Decode`] value.
    pub fn decode(source_ref: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`MontageError::AudioLoad`] value.
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::AudioLoad(msg.into())
    }

    /// Build a [`MontageError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`MontageError::Cleanup`] value.
    pub fn cleanup(msg: impl Into<String>) -> Self {
        Self::Cleanup(msg.into())
    }

    /// Build a [`MontageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stage responsible for this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch { .. } => Stage::Fetch,
            Self::Decode { .. } | Self::NoUsableInput { .. } => Stage::Decode,
            Self::AudioLoad(_) => Stage::Audio,
            Self::Encode(_) => Stage::Encode,
            Self::Cleanup(_) => Stage::Cleanup,
            Self::Validation(_) => Stage::Validate,
            Self::Cancelled { stage } => *stage,
            Self::WorkerPanicked { .. } => Stage::Unknown,
        }
    }

    /// Return `true` for per-image errors that only skip the offending image.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Decode { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
