use super::*;
use std::time::Duration;

use crate::foundation::error::Stage;

fn request_with_missing_images(dir: &Path) -> GenerateRequest {
    GenerateRequest::new(
        [dir.join("missing-a.png"), dir.join("missing-b.png")]
            .map(|p| p.display().to_string()),
        dir.join("a.wav"),
        dir.join("out.mp4"),
    )
}

#[test]
fn scratch_is_namespaced_by_job_and_removed_on_close() {
    let root = tempfile::tempdir().unwrap();
    let id = Uuid::new_v4();
    let scratch = JobScratch::create(root.path(), id).unwrap();
    assert_eq!(scratch.job_id(), id);

    let name = scratch.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(&format!("montage-{}-", id.simple())), "{name}");

    let images = scratch.subdir("images").unwrap();
    std::fs::write(images.join("x"), b"1").unwrap();
    let path = scratch.path().to_path_buf();
    scratch.close().unwrap();
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn concurrent_jobs_get_distinct_scratch() {
    let root = tempfile::tempdir().unwrap();
    let a = JobScratch::create(root.path(), Uuid::new_v4()).unwrap();
    let b = JobScratch::create(root.path(), Uuid::new_v4()).unwrap();
    assert_ne!(a.path(), b.path());
}

#[test]
fn spawned_job_reports_no_usable_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        scratch_root: dir.path().join("scratch"),
        ..PipelineConfig::default()
    };
    let handle = spawn_generate(request_with_missing_images(dir.path()), config).unwrap();
    let err = handle.join().unwrap_err();
    assert!(matches!(err, MontageError::NoUsableInput { attempted: 2 }));
    assert!(!dir.path().join("out.mp4").exists());
    assert_eq!(
        std::fs::read_dir(dir.path().join("scratch")).unwrap().count(),
        0
    );
}

#[test]
fn expired_job_timeout_cancels() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        scratch_root: dir.path().join("scratch"),
        job_timeout: Some(Duration::ZERO),
        ..PipelineConfig::default()
    };
    let handle = spawn_generate(request_with_missing_images(dir.path()), config).unwrap();
    let _ = handle.job_id();
    let err = handle.join().unwrap_err();
    assert!(matches!(err, MontageError::Cancelled { .. }));
}

#[test]
fn worker_panic_is_not_blamed_on_a_stage() {
    let id = Uuid::new_v4();

    let joined = std::thread::spawn(|| -> MontageResult<GenerateReport> {
        panic!("frame {} exploded", 7)
    })
    .join();
    let err = worker_result(id, joined).unwrap_err();
    assert_eq!(err.stage(), Stage::Unknown);
    match &err {
        MontageError::WorkerPanicked { job_id, message } => {
            assert_eq!(job_id, &id.to_string());
            assert_eq!(message, "frame 7 exploded");
        }
        other => panic!("unexpected {other:?}"),
    }

    let joined = std::thread::spawn(|| -> MontageResult<GenerateReport> { panic!("static") })
        .join();
    let err = worker_result(id, joined).unwrap_err();
    assert!(err.to_string().ends_with("worker panicked: static"), "{err}");

    let joined = std::thread::spawn(|| -> MontageResult<GenerateReport> {
        std::panic::panic_any(42_u32)
    })
    .join();
    let err = worker_result(id, joined).unwrap_err();
    assert!(err.to_string().contains("non-string panic payload"), "{err}");
}
