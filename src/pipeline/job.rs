use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use uuid::Uuid;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{MontageError, MontageResult};
use crate::pipeline::orchestrator::{GenerateReport, run_job};
use crate::pipeline::request::{GenerateRequest, PipelineConfig};

/// Private scratch directory for one job: `<scratch_root>/montage-<job id>-XXXXXX`.
///
/// Removed on [`JobScratch::close`], or silently on drop if a panic skips it.
#[derive(Debug)]
pub struct JobScratch {
    job_id: Uuid,
    dir: tempfile::TempDir,
}

impl JobScratch {
    /// Create the scratch directory for `job_id` under `root`.
    pub fn create(root: &Path, job_id: Uuid) -> MontageResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            MontageError::validation(format!(
                "failed to create scratch root '{}': {e}",
                root.display()
            ))
        })?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("montage-{}-", job_id.simple()))
            .tempdir_in(root)
            .map_err(|e| {
                MontageError::validation(format!(
                    "failed to create job scratch under '{}': {e}",
                    root.display()
                ))
            })?;
        tracing::debug!(path = %dir.path().display(), "created job scratch");
        Ok(Self { job_id, dir })
    }

    /// Job this scratch belongs to.
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Scratch directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create (if needed) and return a subdirectory.
    pub fn subdir(&self, name: &str) -> MontageResult<PathBuf> {
        let p = self.dir.path().join(name);
        std::fs::create_dir_all(&p).map_err(|e| {
            MontageError::validation(format!(
                "failed to create scratch dir '{}': {e}",
                p.display()
            ))
        })?;
        Ok(p)
    }

    /// Remove the directory and everything in it.
    pub fn close(self) -> MontageResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            MontageError::cleanup(format!(
                "failed to remove job scratch '{}': {e}",
                path.display()
            ))
        })
    }
}

/// Handle to a job running on its own worker thread.
#[derive(Debug)]
pub struct JobHandle {
    job_id: Uuid,
    cancel: CancelToken,
    worker: JoinHandle<MontageResult<GenerateReport>>,
}

impl JobHandle {
    /// Identifier logged on every event of this job.
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Ask the job to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Return `true` once the worker has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the job and return its result.
    pub fn join(self) -> MontageResult<GenerateReport> {
        worker_result(self.job_id, self.worker.join())
    }
}

fn worker_result(
    job_id: Uuid,
    joined: std::thread::Result<MontageResult<GenerateReport>>,
) -> MontageResult<GenerateReport> {
    joined.unwrap_or_else(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        tracing::error!(%job_id, %message, "job worker panicked");
        Err(MontageError::WorkerPanicked {
            job_id: job_id.to_string(),
            message,
        })
    })
}

/// Run [`generate`](crate::generate) on a dedicated worker thread.
pub fn spawn_generate(request: GenerateRequest, config: PipelineConfig) -> MontageResult<JobHandle> {
    let job_id = Uuid::new_v4();
    let cancel = config.cancel_token();

    let worker_cancel = cancel.clone();
    let worker = std::thread::Builder::new()
        .name(format!("montage-job-{}", &job_id.simple().to_string()[..8]))
        .spawn(move || {
            let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&request.output_path));
            run_job(job_id, &request, &config, &mut sink, &worker_cancel)
        })
        .map_err(|e| MontageError::validation(format!("failed to spawn job worker: {e}")))?;

    tracing::info!(%job_id, "spawned job worker");
    Ok(JobHandle {
        job_id,
        cancel,
        worker,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
