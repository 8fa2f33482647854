use super::*;
use std::sync::Arc;

use crate::{
    cache::fingerprint::SourceFingerprint, foundation::core::FrameRGBA, input::scan::ImageRef,
};

fn request() -> DetectRequest {
    DetectRequest {
        image: ImageRef {
            path: "portrait.jpg".into(),
            file_name: "portrait.jpg".to_string(),
            fingerprint: SourceFingerprint("ab".to_string()),
        },
        frame: Arc::new(FrameRGBA::new(2, 2, vec![128; 16], false).unwrap()),
    }
}

fn sh(script: &str, timeout_ms: u64) -> CommandDetector {
    CommandDetector::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        Duration::from_millis(timeout_ms),
    )
}

#[test]
fn placeholder_is_substituted_or_path_appended() {
    let det = CommandDetector::new(
        "detect",
        vec!["--image={input}".to_string(), "--json".to_string()],
        Duration::from_secs(1),
    );
    let args = det.command_args(std::path::Path::new("/tmp/a.png"));
    assert_eq!(args, vec!["--image=/tmp/a.png", "--json"]);

    let det = CommandDetector::new("detect", vec!["--json".to_string()], Duration::from_secs(1));
    let args = det.command_args(std::path::Path::new("/tmp/a.png"));
    assert_eq!(args, vec!["--json", "/tmp/a.png"]);
}

#[test]
fn fingerprint_tracks_program_args_and_version() {
    let a = sh("true", 100);
    let mut b = sh("true", 100);
    assert_eq!(a.fingerprint_source(), b.fingerprint_source());
    b.version = "v2".to_string();
    assert_ne!(a.fingerprint_source(), b.fingerprint_source());
    assert_ne!(a.fingerprint_source(), sh("false", 100).fingerprint_source());
}

#[cfg(unix)]
#[test]
fn parses_json_from_stdout_and_receives_a_png() {
    let script = r#"test -s "$1" || exit 9
printf '%s' '[{"bbox":{"x":1,"y":2,"width":3,"height":4},"left_eye":{"x":5,"y":6},"right_eye":{"x":7,"y":8}}]'"#;
    let faces = sh(script, 10_000).detect(&request()).unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].bbox.height, 4.0);
    assert_eq!(faces[0].right_eye.y, 8.0);
}

#[cfg(unix)]
#[test]
fn empty_list_is_not_an_error() {
    let faces = sh("echo '[]'", 10_000).detect(&request()).unwrap();
    assert!(faces.is_empty());
}

#[cfg(unix)]
#[test]
fn non_zero_exit_is_detection_failure_with_stderr() {
    let err = sh("echo model missing >&2; exit 3", 10_000)
        .detect(&request())
        .unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DetectionFailure);
    assert!(err.to_string().contains("model missing"));
}

#[cfg(unix)]
#[test]
fn malformed_output_is_detection_failure() {
    let err = sh("echo nope", 10_000).detect(&request()).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DetectionFailure);
}

#[cfg(unix)]
#[test]
fn slow_detector_times_out() {
    let started = Instant::now();
    let err = sh("sleep 5", 100).detect(&request()).unwrap_err();
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn missing_program_is_detection_failure() {
    let det = CommandDetector::new(
        "/nonexistent/facelapse-detector",
        Vec::new(),
        Duration::from_secs(1),
    );
    let err = det.detect(&request()).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DetectionFailure);
}
