use super::*;
use std::sync::Arc;

use crate::{
    cache::fingerprint::SourceFingerprint,
    foundation::core::{BoundingBox, FrameRGBA, Point},
    input::scan::ImageRef,
};

fn temp_dir(name: &str) -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "facelapse_manifest_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn request(name: &str) -> DetectRequest {
    DetectRequest {
        image: ImageRef {
            path: name.into(),
            file_name: name.to_string(),
            fingerprint: SourceFingerprint("00".to_string()),
        },
        frame: Arc::new(FrameRGBA::new(1, 1, vec![0; 4], false).unwrap()),
    }
}

const MANIFEST: &str = r#"{
  "1.jpg": [{"bbox":{"x":0,"y":0,"width":50,"height":50},
             "left_eye":{"x":10,"y":20},"right_eye":{"x":30,"y":20}}],
  "2.jpg": []
}"#;

#[test]
fn replays_entries_and_reports_missing_ones() {
    let dir = temp_dir("replay");
    let path = dir.join("faces.json");
    std::fs::write(&path, MANIFEST).unwrap();

    let det = ManifestDetector::load(&path).unwrap();
    assert_eq!(det.len(), 2);

    let faces = det.detect(&request("1.jpg")).unwrap();
    assert_eq!(faces[0].left_eye, Point::new(10.0, 20.0));
    assert!(det.detect(&request("2.jpg")).unwrap().is_empty());

    let err = det.detect(&request("3.jpg")).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DetectionFailure);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn fingerprint_changes_with_manifest_content() {
    let dir = temp_dir("fp");
    let path = dir.join("faces.json");
    std::fs::write(&path, MANIFEST).unwrap();
    let a = ManifestDetector::load(&path).unwrap().fingerprint_source();
    std::fs::write(&path, r#"{"1.jpg": []}"#).unwrap();
    let b = ManifestDetector::load(&path).unwrap().fingerprint_source();
    assert_ne!(a, b);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn invalid_manifest_is_a_validation_error() {
    let dir = temp_dir("invalid");
    let path = dir.join("faces.json");
    std::fs::write(&path, "[1, 2]").unwrap();
    let err = ManifestDetector::load(&path).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn in_memory_entries_fingerprint_deterministically() {
    let face = FaceCandidate {
        bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        left_eye: Point::new(0.0, 0.0),
        right_eye: Point::new(1.0, 0.0),
    };
    let mut entries = BTreeMap::new();
    entries.insert("a.png".to_string(), vec![face]);
    let a = ManifestDetector::from_entries(entries.clone()).unwrap();
    let b = ManifestDetector::from_entries(entries).unwrap();
    assert_eq!(a.fingerprint_source(), b.fingerprint_source());
    assert!(!a.is_empty());
}
