use std::collections::BTreeMap;

use super::*;

#[derive(serde::Serialize)]
struct CaptionA {
    text: String,
    size: f64,
}

#[derive(serde::Serialize)]
struct CaptionB {
    size: f64,
    text: String,
}

#[test]
fn declaration_order_does_not_change_fingerprint() {
    let a = fingerprint_config(
        "caption",
        &CaptionA {
            text: "1.jpg".to_string(),
            size: 0.05,
        },
    )
    .unwrap();
    let b = fingerprint_config(
        "caption",
        &CaptionB {
            size: 0.05,
            text: "1.jpg".to_string(),
        },
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn map_insertion_order_does_not_change_fingerprint() {
    let mut x = serde_json::Map::new();
    x.insert("b".to_string(), serde_json::json!(2));
    x.insert("a".to_string(), serde_json::json!(1));
    let mut y = serde_json::Map::new();
    y.insert("a".to_string(), serde_json::json!(1));
    y.insert("b".to_string(), serde_json::json!(2));
    assert_eq!(
        fingerprint_json("detect", &serde_json::Value::Object(x)),
        fingerprint_json("detect", &serde_json::Value::Object(y))
    );
}

#[test]
fn value_and_stage_changes_change_fingerprint() {
    let base = BTreeMap::from([("text", "a")]);
    let other = BTreeMap::from([("text", "b")]);
    let fa = fingerprint_config("caption", &base).unwrap();
    assert_ne!(fa, fingerprint_config("caption", &other).unwrap());
    assert_ne!(fa, fingerprint_config("render", &base).unwrap());
    assert_eq!(fa, fingerprint_config("caption", &base).unwrap());
}

#[test]
fn content_fingerprint_is_sha256_hex() {
    let dir = std::env::temp_dir().join(format!("facelapse_fp_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("abc.bin");
    std::fs::write(&path, b"abc").unwrap();

    let fp = fingerprint_file(&path, FingerprintMode::Content).unwrap();
    assert_eq!(
        fp.as_str(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    let meta = fingerprint_file(&path, FingerprintMode::Metadata).unwrap();
    assert_eq!(meta.as_str().len(), 32);
    assert_eq!(meta, fingerprint_file(&path, FingerprintMode::Metadata).unwrap());

    std::fs::remove_dir_all(&dir).ok();
}
