use std::ffi::OsString;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::frame::FrameRgb;

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Final output file path.
    pub out_path: PathBuf,
    /// Replace the output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Create options for writing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw `rgb24` frames to its stdin.
///
/// `ffmpeg` writes to a hidden sibling file which is renamed over `out_path` only when encoding
/// succeeds. Aborting, failing, or dropping the sink early kills the child and deletes that file.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    partial_path: Option<PathBuf>,

    cfg: Option<SinkConfig>,
    frame_len: usize,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            partial_path: None,
            cfg: None,
            frame_len: 0,
            last_idx: None,
        }
    }

    /// Path `ffmpeg` is currently writing to, if a run is in progress.
    pub fn partial_path(&self) -> Option<&Path> {
        self.partial_path.as_deref()
    }

    fn join_stderr(&mut self) -> String {
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Some(Ok(Err(e))) => format!("<stderr read failed: {e}>"),
            Some(Err(_)) => "<stderr drain thread panicked>".to_string(),
            None => String::new(),
        }
    }

    fn discard_partial(&mut self) {
        if let Some(path) = self.partial_path.take()
            && path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output");
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> MontageResult<()> {
        cfg.output.validate()?;
        if self.child.is_some() {
            return Err(MontageError::encode("ffmpeg sink already started"));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(MontageError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(MontageError::encode(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        let partial = partial_path_for(&self.opts.out_path)?;
        let args = build_args(&cfg, &partial)?;
        tracing::debug!(?args, "spawning ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                MontageError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MontageError::encode("failed to open ffmpeg stdio pipes"));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.frame_len = cfg.output.canvas.rgb8_len();
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.partial_path = Some(partial);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgb) -> MontageResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| MontageError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(MontageError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        let canvas = cfg.output.canvas;
        if frame.width != canvas.width || frame.height != canvas.height {
            return Err(MontageError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, canvas.width, canvas.height
            )));
        }
        if frame.data.len() != self.frame_len {
            return Err(MontageError::encode(
                "frame.data size mismatch with width*height*3",
            ));
        }
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MontageError::encode("ffmpeg sink is already finalized"));
        };
        if let Err(e) = stdin.write_all(&frame.data) {
            // ffmpeg usually closed the pipe because it failed; its stderr says why.
            drop(self.stdin.take());
            if let Some(child) = self.child.as_mut() {
                let _ = child.wait();
            }
            let stderr = self.join_stderr();
            return Err(MontageError::encode(format!(
                "failed to write frame {} to ffmpeg: {e}: {stderr}",
                idx.0
            )));
        }
        Ok(())
    }

    fn end(&mut self) -> MontageResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MontageError::encode("ffmpeg sink not started"))?;

        let status = child.wait();
        let stderr = self.join_stderr();
        let status = match status {
            Ok(s) => s,
            Err(e) => {
                self.discard_partial();
                return Err(MontageError::encode(format!(
                    "failed to wait for ffmpeg to finish: {e}"
                )));
            }
        };
        if !status.success() {
            self.discard_partial();
            return Err(MontageError::encode(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        let partial = self
            .partial_path
            .take()
            .ok_or_else(|| MontageError::encode("ffmpeg sink lost its partial output path"))?;
        if let Err(e) = std::fs::rename(&partial, &self.opts.out_path) {
            let _ = std::fs::remove_file(&partial);
            return Err(MontageError::encode(format!(
                "failed to move '{}' into place at '{}': {e}",
                partial.display(),
                self.opts.out_path.display()
            )));
        }

        tracing::info!(path = %self.opts.out_path.display(), "output committed");
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.join_stderr();
        self.discard_partial();
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() || self.partial_path.is_some() {
            self.abort();
        }
    }
}

/// Hidden sibling of `out_path` used while `ffmpeg` is still writing.
pub fn partial_path_for(out_path: &Path) -> MontageResult<PathBuf> {
    let name = out_path.file_name().ok_or_else(|| {
        MontageError::validation(format!(
            "output path '{}' has no file name",
            out_path.display()
        ))
    })?;
    let mut partial = OsString::from(".");
    partial.push(name);
    partial.push(format!(".partial-{}", uuid::Uuid::new_v4().simple()));
    Ok(out_path.with_file_name(partial))
}

/// Full `ffmpeg` argument list for one run writing to `dest`.
pub fn build_args(cfg: &SinkConfig, dest: &Path) -> MontageResult<Vec<OsString>> {
    let out = &cfg.output;
    let rate = format!("{}/{}", out.fps.num, out.fps.den);
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
        "-s",
        &format!("{}x{}", out.canvas.width, out.canvas.height),
        // For rawvideo input `-r` goes before `-i`.
        "-r",
        &rate,
        "-i",
        "pipe:0",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    if let Some(audio) = cfg.audio.as_ref() {
        if audio.sample_rate == 0 || audio.channels == 0 {
            return Err(MontageError::validation(
                "audio sample_rate and channels must be non-zero when audio is enabled",
            ));
        }
        for a in [
            "-f",
            "f32le",
            "-ar",
            &audio.sample_rate.to_string(),
            "-ac",
            &audio.channels.to_string(),
            "-i",
        ] {
            args.push(a.into());
        }
        args.push(audio.path.clone().into_os_string());
        for a in ["-map", "0:v:0", "-map", "1:a:0", "-c:a", &out.audio_codec] {
            args.push(a.into());
        }
    } else {
        args.push("-an".into());
    }

    for a in ["-c:v", &out.video_codec, "-pix_fmt", &out.pixel_format] {
        args.push(a.into());
    }
    if matches!(out.container.as_str(), "mp4" | "mov") {
        args.push("-movflags".into());
        args.push("+faststart".into());
    }
    args.push("-f".into());
    args.push(out.container.clone().into());
    args.push(dest.as_os_str().to_owned());
    Ok(args)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MontageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            MontageError::encode(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
