use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MontageError::fetch("a.png", "404")
            .to_string()
            .contains("fetch error for 'a.png': 404")
    );
    assert!(
        MontageError::decode("a.png", "bad magic")
            .to_string()
            .contains("decode error for 'a.png'")
    );
    assert!(
        MontageError::audio("x")
            .to_string()
            .contains("audio load error:")
    );
    assert!(MontageError::encode("x").to_string().contains("encode error:"));
    assert!(
        MontageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MontageError::Cancelled {
            stage: Stage::Encode
        }
        .to_string()
        .contains("cancelled during encode")
    );
}

#[test]
fn stages_and_recoverability() {
    assert_eq!(MontageError::fetch("a", "b").stage(), Stage::Fetch);
    assert_eq!(MontageError::decode("a", "b").stage(), Stage::Decode);
    assert_eq!(
        MontageError::NoUsableInput { attempted: 3 }.stage(),
        Stage::Decode
    );
    assert_eq!(MontageError::audio("x").stage(), Stage::Audio);
    assert_eq!(MontageError::encode("x").stage(), Stage::Encode);
    assert_eq!(MontageError::cleanup("x").stage(), Stage::Cleanup);

    assert!(MontageError::fetch("a", "b").is_recoverable());
    assert!(MontageError::decode("a", "b").is_recoverable());
    assert!(!MontageError::NoUsableInput { attempted: 1 }.is_recoverable());
    assert!(!MontageError::encode("x").is_recoverable());

    let panicked = MontageError::WorkerPanicked {
        job_id: "j1".into(),
        message: "boom".into(),
    };
    assert_eq!(panicked.stage(), Stage::Unknown);
    assert_eq!(panicked.stage().as_str(), "unknown");
    assert!(!panicked.is_recoverable());
    assert_eq!(panicked.to_string(), "job j1 worker panicked: boom");
}
