use super::*;
use crate::encode::sink::{AudioInputConfig, OutputSpec};
use crate::foundation::core::{Canvas, Fps};

fn small_cfg(audio: Option<AudioInputConfig>) -> SinkConfig {
    SinkConfig {
        output: OutputSpec {
            canvas: Canvas {
                width: 16,
                height: 8,
            },
            fps: Fps { num: 24, den: 1 },
            ..OutputSpec::default()
        },
        audio,
    }
}

fn strs(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[test]
fn partial_path_is_hidden_sibling() {
    let p = partial_path_for(Path::new("/tmp/out/final.mp4")).unwrap();
    assert_eq!(p.parent(), Some(Path::new("/tmp/out")));
    let name = p.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".final.mp4.partial-"), "{name}");

    let q = partial_path_for(Path::new("/tmp/out/final.mp4")).unwrap();
    assert_ne!(p, q);

    assert!(partial_path_for(Path::new("/")).is_err());
}

#[test]
fn args_without_audio_disable_audio_stream() {
    let args = strs(&build_args(&small_cfg(None), Path::new("dest.tmp")).unwrap());
    let joined = args.join(" ");
    assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 16x8 -r 24/1 -i pipe:0"));
    assert!(args.contains(&"-an".to_string()));
    assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p"));
    assert!(joined.ends_with("-f mp4 dest.tmp"));
    assert!(!args.contains(&"-shortest".to_string()));
}

#[test]
fn args_with_audio_map_both_inputs() {
    let audio = AudioInputConfig {
        path: PathBuf::from("audio.f32le"),
        sample_rate: 48_000,
        channels: 2,
    };
    let args = strs(&build_args(&small_cfg(Some(audio)), Path::new("dest.tmp")).unwrap());
    let joined = args.join(" ");
    assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i audio.f32le"));
    assert!(joined.contains("-map 0:v:0 -map 1:a:0 -c:a aac"));
    assert!(!args.contains(&"-an".to_string()));
    assert!(!args.contains(&"-shortest".to_string()));
}

#[test]
fn args_reject_empty_audio_layout() {
    let audio = AudioInputConfig {
        path: PathBuf::from("audio.f32le"),
        sample_rate: 0,
        channels: 2,
    };
    assert!(build_args(&small_cfg(Some(audio)), Path::new("x")).is_err());
}

#[test]
fn begin_rejects_odd_dimensions_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.path().join("o.mp4")));
    let mut cfg = small_cfg(None);
    cfg.output.canvas.width = 15;
    let err = sink.begin(cfg).unwrap_err();
    assert!(matches!(err, MontageError::Validation(_)));
    assert!(sink.partial_path().is_none());
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = FrameRgb::black(Canvas {
        width: 16,
        height: 8,
    });
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}

#[test]
fn abort_removes_partial_and_leaves_no_output() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("o.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(small_cfg(None)).unwrap();
    let frame = FrameRgb::black(Canvas {
        width: 16,
        height: 8,
    });
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.abort();

    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn end_commits_output_atomically() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("o.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(small_cfg(None)).unwrap();
    let frame = FrameRgb::black(Canvas {
        width: 16,
        height: 8,
    });
    for i in 0..6 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    assert!(sink.push_frame(FrameIndex(2), &frame).is_err());
    sink.end().unwrap();

    assert!(out.is_file());
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    let names: Vec<_> = std::fs::read_dir(out.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![OsString::from("o.mp4")]);
}
