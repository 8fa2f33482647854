use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    cache::fingerprint::{FingerprintMode, fingerprint_config, fingerprint_file},
    detect::{DetectRequest, FaceCandidate, FaceDetector},
    foundation::error::{FacelapseError, FacelapseResult},
};

/// Detector that replays precomputed landmarks from a JSON file mapping file name to faces.
///
/// Useful when detection ran elsewhere (a notebook, a GPU box) and for reproducible tests. A
/// photo with no entry is a detection failure; an entry with an empty list means "no face".
#[derive(Clone, Debug)]
pub struct ManifestDetector {
    path: PathBuf,
    entries: BTreeMap<String, Vec<FaceCandidate>>,
    digest: String,
}

impl ManifestDetector {
    pub fn load(path: &Path) -> FacelapseResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read detection manifest '{}'", path.display()))?;
        let entries: BTreeMap<String, Vec<FaceCandidate>> = serde_json::from_slice(&bytes)
            .map_err(|e| {
                FacelapseError::validation(format!(
                    "detection manifest '{}' is invalid: {e}",
                    path.display()
                ))
            })?;
        let digest = fingerprint_file(path, FingerprintMode::Content)?.0;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
            digest,
        })
    }

    pub fn from_entries(entries: BTreeMap<String, Vec<FaceCandidate>>) -> FacelapseResult<Self> {
        let digest = fingerprint_config("manifest", &entries)?.0;
        Ok(Self {
            path: PathBuf::new(),
            entries,
            digest,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FaceDetector for ManifestDetector {
    fn detect(&self, req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>> {
        self.entries
            .get(&req.image.file_name)
            .cloned()
            .ok_or_else(|| {
                FacelapseError::detection(format!(
                    "no entry for '{}' in detection manifest '{}'",
                    req.image.file_name,
                    self.path.display()
                ))
            })
    }

    fn fingerprint_source(&self) -> String {
        format!("manifest:{}", self.digest)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/detect/manifest.rs"]
mod tests;
