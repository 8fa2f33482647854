use super::*;

#[test]
fn defaults_are_valid() {
    FacelapseConfig::default().validate().unwrap();
}

#[test]
fn partial_json_fills_in_defaults() {
    let cfg: FacelapseConfig = serde_json::from_str(
        r#"{
            "alignment": {"eye_target_separation": 100, "canvas_size": [640, 480]},
            "caption": {"enabled": true, "template": "{stem} ({width}x{height})"},
            "face_selection_overrides": {"party.jpg": {"rule": "largest"}},
            "detector": {"kind": "manifest", "path": "faces.json"},
            "pipeline": {"on_failure": "skip", "threads": 2}
        }"#,
    )
    .unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.alignment.eye_target_separation, 100.0);
    assert_eq!(cfg.alignment.max_rotation_degrees, 45.0);
    assert_eq!(cfg.pipeline.on_failure, FailurePolicy::Skip);
    assert_eq!(
        cfg.face_selection_overrides["party.jpg"],
        SelectionRule::Largest
    );
    assert_eq!(
        cfg.caption.text_for("IMG_001.jpg", (4000, 3000)).as_deref(),
        Some("IMG_001 (4000x3000)")
    );
    assert_eq!(cfg.video.fps, 48);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_json::from_str::<FacelapseConfig>(r#"{"aligment": {}}"#).unwrap_err();
    assert!(err.to_string().contains("aligment"));
    let err =
        serde_json::from_str::<FacelapseConfig>(r#"{"cache": {"enabled": true, "ttl": 3}}"#)
            .unwrap_err();
    assert!(err.to_string().contains("ttl"));
}

#[test]
fn caption_text_rules() {
    let mut c = CaptionConfig::default();
    assert_eq!(c.text_for("a.jpg", (1, 1)), None);
    c.enabled = true;
    assert_eq!(c.text_for("a.b.jpg", (1, 1)).as_deref(), Some("a.b"));
    c.template = "{file}".to_string();
    c.overrides.insert("x.png".to_string(), "Day one".to_string());
    assert_eq!(c.text_for("x.png", (1, 1)).as_deref(), Some("Day one"));
    assert_eq!(c.text_for("y.png", (1, 1)).as_deref(), Some("y.png"));
}

#[test]
fn validation_catches_bad_values() {
    let mut cfg = FacelapseConfig::default();
    cfg.alignment.eye_target_separation = 0.0;
    assert!(cfg.validate().is_err());

    let mut cfg = FacelapseConfig::default();
    cfg.alignment.canvas_size = [0, 10];
    assert!(cfg.validate().is_err());

    let mut cfg = FacelapseConfig::default();
    cfg.alignment.canvas_size = [641, 480];
    assert!(cfg.validate().is_err());
    cfg.video.enabled = false;
    assert!(cfg.validate().is_ok());

    let mut cfg = FacelapseConfig::default();
    cfg.output.format = OutputFormat::Jpeg;
    cfg.alignment.background_rgba = [0, 0, 0, 0];
    assert!(cfg.validate().is_err());

    let mut cfg = FacelapseConfig::default();
    cfg.video.fps = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = FacelapseConfig::default();
    cfg.detector = DetectorConfig::Command {
        program: PathBuf::from("det"),
        args: Vec::new(),
        timeout_ms: 0,
        version: String::new(),
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn load_config_reports_the_file() {
    let dir = std::env::temp_dir().join(format!(
        "facelapse_config_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let good = dir.join("good.json");
    std::fs::write(&good, r#"{"output": {"format": "jpeg", "jpeg_quality": 80}}"#).unwrap();
    let cfg = load_config(&good).unwrap();
    assert_eq!(cfg.output.format, OutputFormat::Jpeg);

    let bad = dir.join("bad.json");
    std::fs::write(&bad, r#"{"output": {"format": "gif"}}"#).unwrap();
    let err = load_config(&bad).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
    assert!(err.to_string().contains("bad.json"));

    assert!(load_config(&dir.join("missing.json")).is_err());
    let _ = std::fs::remove_dir_all(dir);
}
