use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "facelapse_output_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).unwrap();
    p
}

#[test]
fn frame_paths_are_one_based_numbers() {
    assert_eq!(
        frame_path(Path::new("frames"), 12, "png"),
        Path::new("frames").join("12.png")
    );
}

#[test]
fn clearing_only_touches_numbered_frames() {
    let dir = temp_dir("clear");
    for name in ["1.png", "2.jpg", "10.JPEG", "notes.txt", "a1.png", "3.webp"] {
        std::fs::write(dir.join(name), b"x").unwrap();
    }
    assert_eq!(clear_numbered_frames(&dir).unwrap(), 3);
    let mut left: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["3.webp", "a1.png", "notes.txt"]);
    assert_eq!(clear_numbered_frames(&dir.join("missing")).unwrap(), 0);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn write_frame_replaces_existing_file() {
    let dir = temp_dir("write");
    let path = frame_path(&dir, 1, "png");
    write_frame(&path, b"old").unwrap();
    write_frame(&path, b"new").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"new");
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn reset_dir_empties_and_recreates() {
    let dir = temp_dir("reset");
    let errors = dir.join("errors");
    std::fs::create_dir_all(errors.join("nested")).unwrap();
    std::fs::write(errors.join("old.jpg"), b"x").unwrap();
    reset_dir(&errors).unwrap();
    assert!(errors.is_dir());
    assert_eq!(std::fs::read_dir(&errors).unwrap().count(), 0);
    let _ = std::fs::remove_dir_all(dir);
}
