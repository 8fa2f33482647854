use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "facelapse_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn scan_sorts_naturally_and_skips_hidden_files() {
    let dir = temp_dir("scan_sort");
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    for name in ["10.jpg", "2.jpg", "1.jpg", ".DS_Store"] {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    let refs = scan_input_dir(&dir, FingerprintMode::Content).unwrap();
    let names = refs.iter().map(|r| r.file_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["1.jpg", "2.jpg", "10.jpg"]);
    assert_eq!(refs[2].stem(), "10");
    assert_ne!(refs[0].fingerprint, refs[1].fingerprint);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn scan_rejects_unsupported_files() {
    let dir = temp_dir("scan_unsupported");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("1.jpg"), b"x").unwrap();
    std::fs::write(dir.join("notes.txt"), b"x").unwrap();

    let err = scan_input_dir(&dir, FingerprintMode::Content).unwrap_err();
    assert!(err.to_string().contains("notes.txt"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn scan_rejects_empty_directory() {
    let dir = temp_dir("scan_empty");
    std::fs::create_dir_all(&dir).unwrap();
    let err = scan_input_dir(&dir, FingerprintMode::Metadata).unwrap_err();
    assert!(err.to_string().contains("no images detected"));
    std::fs::remove_dir_all(&dir).ok();
}
