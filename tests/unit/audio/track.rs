use super::*;

fn write_wav_i16(path: &Path, rate: u32, channels: u16, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        w.write_sample(s).unwrap();
    }
    w.finalize().unwrap();
}

#[test]
fn new_validates_layout() {
    assert!(AudioTrack::new(0, 2, vec![0.0; 4]).is_err());
    assert!(AudioTrack::new(48_000, 0, vec![0.0; 4]).is_err());
    assert!(AudioTrack::new(48_000, 2, vec![0.0; 3]).is_err());

    let t = AudioTrack::new(4, 2, vec![0.0; 12]).unwrap();
    assert_eq!(t.frames(), 6);
    assert_eq!(t.duration_secs(), 1.5);
    assert_eq!(t.secs_to_frames(4.4), 18);
}

#[test]
fn wav_int16_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav_i16(&path, 8_000, 1, &[0, 16_384, -32_768, 32_767]);

    let t = load_audio(&path).unwrap();
    assert_eq!(t.sample_rate(), 8_000);
    assert_eq!(t.channels(), 1);
    assert_eq!(t.frames(), 4);
    assert_eq!(t.samples()[0], 0.0);
    assert_eq!(t.samples()[1], 0.5);
    assert_eq!(t.samples()[2], -1.0);
    assert!((t.samples()[3] - 1.0).abs() < 1e-4);
}

#[test]
fn wav_float_is_read_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.WAV");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut w = hound::WavWriter::create(&path, spec).unwrap();
    for s in [0.25f32, -0.25, 0.5, -0.5] {
        w.write_sample(s).unwrap();
    }
    w.finalize().unwrap();

    let t = load_audio(&path).unwrap();
    assert_eq!(t.samples(), &[0.25, -0.25, 0.5, -0.5]);
    assert_eq!(t.frames(), 2);
}

#[test]
fn missing_empty_and_corrupt_files_are_audio_errors() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_audio(&dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, MontageError::AudioLoad(_)));

    let empty = dir.path().join("empty.wav");
    write_wav_i16(&empty, 8_000, 1, &[]);
    let err = load_audio(&empty).unwrap_err();
    assert!(err.to_string().contains("no samples"));

    let corrupt = dir.path().join("corrupt.wav");
    std::fs::write(&corrupt, b"RIFF nonsense").unwrap();
    let err = load_audio(&corrupt).unwrap_err();
    assert!(matches!(err, MontageError::AudioLoad(_)));
}

#[test]
fn f32le_output_is_little_endian_interleaved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.f32le");
    let t = AudioTrack::new(2, 2, vec![1.0, -1.0, 0.5, 0.0]).unwrap();
    write_f32le(&t, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
    assert_eq!(&bytes[4..8], &(-1.0f32).to_le_bytes());
    assert_eq!(&bytes[8..12], &0.5f32.to_le_bytes());
}
