use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{MontageError, MontageResult};

/// Sample rate used when decoding non-WAV audio through `ffmpeg`.
pub const DECODE_SAMPLE_RATE: u32 = 48_000;

/// Decoded interleaved floating-point PCM.
///
/// Samples are shared; derived tracks never mutate their source.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    sample_rate: u32,
    channels: u16,
    samples: Arc<[f32]>,
}

impl AudioTrack {
    /// Wrap interleaved samples. The sample count must be a whole number of frames.
    pub fn new(sample_rate: u32, channels: u16, samples: impl Into<Arc<[f32]>>) -> MontageResult<Self> {
        let samples = samples.into();
        if sample_rate == 0 {
            return Err(MontageError::audio("sample rate must be non-zero"));
        }
        if channels == 0 {
            return Err(MontageError::audio("channel count must be non-zero"));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(MontageError::audio(format!(
                "{} samples is not a whole number of {channels}-channel frames",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> u64 {
        (self.samples.len() / usize::from(self.channels)) as u64
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Sample frames needed to cover `secs` at this track's rate, rounded to nearest.
    pub fn secs_to_frames(&self, secs: f64) -> u64 {
        (secs * f64::from(self.sample_rate)).round().max(0.0) as u64
    }

    /// Return `true` when the track has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Load an audio file.
///
/// `.wav` files are read directly; anything else is decoded to stereo `f32` PCM at
/// [`DECODE_SAMPLE_RATE`] by the system `ffmpeg`.
#[tracing::instrument]
pub fn load_audio(path: &Path) -> MontageResult<AudioTrack> {
    if !path.is_file() {
        return Err(MontageError::audio(format!(
            "audio file '{}' does not exist",
            path.display()
        )));
    }
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    let track = if is_wav {
        load_wav(path)?
    } else {
        decode_with_ffmpeg(path, DECODE_SAMPLE_RATE)?
    };
    if track.is_empty() {
        return Err(MontageError::audio(format!(
            "audio file '{}' contains no samples",
            path.display()
        )));
    }
    tracing::info!(
        sample_rate = track.sample_rate(),
        channels = track.channels(),
        duration_secs = track.duration_secs(),
        "loaded audio"
    );
    Ok(track)
}

/// Read a WAV file into normalized `f32` samples.
pub fn load_wav(path: &Path) -> MontageResult<AudioTrack> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        MontageError::audio(format!("failed to open wav '{}': {e}", path.display()))
    })?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect()
        }
    };
    let samples = samples.map_err(|e| {
        MontageError::audio(format!("failed to decode wav '{}': {e}", path.display()))
    })?;

    AudioTrack::new(spec.sample_rate, spec.channels, samples)
}

/// Decode any ffmpeg-readable audio to stereo interleaved `f32` PCM.
pub fn decode_with_ffmpeg(path: &Path, sample_rate: u32) -> MontageResult<AudioTrack> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| MontageError::audio(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(MontageError::audio(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(MontageError::audio(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }

    let pcm: Vec<f32> = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    AudioTrack::new(sample_rate, 2, pcm)
}

/// Write interleaved samples as raw little-endian `f32` PCM.
pub fn write_f32le(track: &AudioTrack, out_path: &Path) -> MontageResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(track.samples().len() * 4);
    for &sample in track.samples() {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        MontageError::audio(format!(
            "failed to write audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/track.rs"]
mod tests;
