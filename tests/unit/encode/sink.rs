use super::*;

fn frame(v: u8) -> FrameRgb {
    FrameRgb {
        width: 1,
        height: 1,
        data: vec![v; 3],
    }
}

#[test]
fn default_output_spec_matches_delivery_format() {
    let spec = OutputSpec::default();
    assert_eq!(spec.canvas, Canvas::default());
    assert_eq!(spec.fps, Fps { num: 24, den: 1 });
    assert_eq!(spec.video_codec, "libx264");
    assert_eq!(spec.audio_codec, "aac");
    assert_eq!(spec.container, "mp4");
    assert_eq!(spec.pixel_format, "yuv420p");
    spec.validate().unwrap();
}

#[test]
fn output_spec_validation() {
    let mut spec = OutputSpec::default();
    spec.canvas.height = 1079;
    assert!(spec.validate().is_err());

    let mut spec = OutputSpec::default();
    spec.fps.den = 0;
    assert!(spec.validate().is_err());

    let mut spec = OutputSpec::default();
    spec.video_codec = " ".into();
    assert!(spec.validate().is_err());

    let mut spec = OutputSpec::default();
    spec.canvas.width = 1;
    spec.pixel_format = "yuv444p".into();
    spec.validate().unwrap();
}

#[test]
fn output_spec_fills_missing_json_fields() {
    let spec: OutputSpec =
        serde_json::from_str(r#"{"canvas":{"width":640,"height":360}}"#).unwrap();
    assert_eq!(spec.canvas.width, 640);
    assert_eq!(spec.fps.num, 24);
    assert_eq!(spec.video_codec, "libx264");
}

#[test]
fn in_memory_sink_records_in_order_and_clears_on_abort() {
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig {
        output: OutputSpec::default(),
        audio: None,
    })
    .unwrap();
    sink.push_frame(FrameIndex(0), &frame(1)).unwrap();
    sink.push_frame(FrameIndex(1), &frame(2)).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame(3)).is_err());
    assert_eq!(sink.frames().len(), 2);
    assert!(sink.config().is_some());

    sink.abort();
    assert!(sink.frames().is_empty());
    assert!(!sink.is_finished());

    sink.push_frame(FrameIndex(0), &frame(1)).unwrap();
    sink.end().unwrap();
    assert!(sink.is_finished());
}
