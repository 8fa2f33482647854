use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::FacelapseResult;

/// Path of frame `index` (1-based) inside `frames_dir`.
pub fn frame_path(frames_dir: &Path, index: u64, extension: &str) -> PathBuf {
    frames_dir.join(format!("{index}.{extension}"))
}

/// Write a frame so that readers never see a partial file.
pub(crate) fn write_frame(path: &Path, bytes: &[u8]) -> FacelapseResult<()> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    let tmp = path.with_file_name(format!(".{name}.tmp-{}", std::process::id()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write frame '{}'", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(anyhow::Error::new(e)
            .context(format!("publish frame '{}'", path.display()))
            .into());
    }
    Ok(())
}

/// Remove frames left by an earlier run: files named `<digits>.png|jpg|jpeg`. Anything else in
/// the directory is left alone.
pub(crate) fn clear_numbered_frames(frames_dir: &Path) -> FacelapseResult<usize> {
    let rd = match std::fs::read_dir(frames_dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("list frames directory '{}'", frames_dir.display()))
                .into());
        }
    };

    let mut removed = 0;
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_numbered_frame(&path) {
            continue;
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("remove stale frame '{}'", path.display()))?;
        removed += 1;
    }
    Ok(removed)
}

fn is_numbered_frame(path: &Path) -> bool {
    let stem_ok = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
    let ext_ok = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"));
    stem_ok && ext_ok
}

/// Remove and recreate `dir`.
pub(crate) fn reset_dir(dir: &Path) -> FacelapseResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("clear directory '{}'", dir.display()))
                .into());
        }
    }
    std::fs::create_dir_all(dir).with_context(|| format!("create directory '{}'", dir.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/output.rs"]
mod tests;
