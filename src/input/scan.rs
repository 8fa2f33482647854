use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::{
    cache::fingerprint::{FingerprintMode, SourceFingerprint, fingerprint_file},
    foundation::error::{FacelapseError, FacelapseResult},
    input::natural::natural_cmp,
};

/// Raster extensions accepted as inputs (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff"];

/// Identity of one input photo.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageRef {
    pub path: PathBuf,
    /// File name including extension; the natural-sort key and the selection-rule lookup key.
    pub file_name: String,
    pub fingerprint: SourceFingerprint,
}

impl ImageRef {
    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// Enumerate the photos directly inside `dir`, fingerprint them, and return them in natural
/// order of file name.
///
/// Hidden files are ignored. Any other file with an unsupported extension is rejected so a
/// stray document never silently disappears from the timelapse.
pub fn scan_input_dir(dir: &Path, mode: FingerprintMode) -> FacelapseResult<Vec<ImageRef>> {
    let rd = std::fs::read_dir(dir)
        .with_context(|| format!("read input directory '{}'", dir.display()))?;

    let mut candidates = Vec::new();
    for entry in rd {
        let entry = entry.with_context(|| format!("list input directory '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()).map(str::to_owned) else {
            return Err(FacelapseError::validation(format!(
                "input file name is not valid UTF-8: '{}'",
                path.display()
            )));
        };
        if file_name.starts_with('.') {
            continue;
        }
        if !is_supported(&path) {
            return Err(FacelapseError::validation(format!(
                "unsupported image type for input '{}' (supported: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }
        candidates.push((path, file_name));
    }

    if candidates.is_empty() {
        return Err(FacelapseError::validation(format!(
            "no images detected in '{}'",
            dir.display()
        )));
    }

    candidates.sort_by(|a, b| natural_cmp(&a.1, &b.1));

    candidates
        .into_par_iter()
        .map(|(path, file_name)| {
            let fingerprint = fingerprint_file(&path, mode)?;
            Ok(ImageRef {
                path,
                file_name,
                fingerprint,
            })
        })
        .collect()
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/input/scan.rs"]
mod tests;
