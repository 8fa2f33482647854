use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FacelapseError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FacelapseError::detection("x")
            .to_string()
            .contains("detection failure:")
    );
    assert!(
        FacelapseError::degenerate("x")
            .to_string()
            .contains("degenerate geometry:")
    );
    assert!(
        FacelapseError::cache_corruption("x")
            .to_string()
            .contains("cache corruption:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FacelapseError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn ambiguous_selection_points_at_diagnostic() {
    let err = FacelapseError::AmbiguousFaceSelection {
        candidates: 2,
        diagnostic: Some(PathBuf::from("out/error/group.jpg")),
    };
    let msg = err.to_string();
    assert!(msg.contains("found 2 faces"));
    assert!(msg.contains("out/error/group.jpg"));
    assert_eq!(err.kind().as_str(), "AmbiguousFaceSelection");
    assert_eq!(
        err.diagnostic_path(),
        Some(std::path::Path::new("out/error/group.jpg"))
    );
}

#[test]
fn kinds_map_one_to_one() {
    assert_eq!(
        FacelapseError::NoFaceDetected.kind(),
        ErrorKind::NoFaceDetected
    );
    assert_eq!(
        FacelapseError::ExcessiveRotation {
            degrees: 50.0,
            limit: 45.0
        }
        .kind(),
        ErrorKind::ExcessiveRotation
    );
    assert_eq!(
        FacelapseError::detection("timeout").kind().to_string(),
        "DetectionFailure"
    );
}
