use std::{io::Read as _, path::Path};

use anyhow::Context as _;
use sha2::Digest as _;

use crate::foundation::{
    error::{FacelapseError, FacelapseResult},
    math::Fnv128,
};

/// Identity of a source photo's content (or of its size + mtime in `metadata` mode).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SourceFingerprint(pub String);

impl SourceFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of the configuration a stage's output depends on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ConfigFingerprint(pub String);

impl ConfigFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How source photos are fingerprinted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintMode {
    /// SHA-256 of the file bytes.
    #[default]
    Content,
    /// Size and modification time; cheaper, but misses in-place edits that keep both.
    Metadata,
}

pub fn fingerprint_file(path: &Path, mode: FingerprintMode) -> FacelapseResult<SourceFingerprint> {
    match mode {
        FingerprintMode::Content => {
            let mut file = std::fs::File::open(path)
                .with_context(|| format!("open '{}' for hashing", path.display()))?;
            let mut hasher = sha2::Sha256::new();
            let mut buf = vec![0u8; 128 * 1024];
            loop {
                let n = file
                    .read(&mut buf)
                    .with_context(|| format!("read '{}' for hashing", path.display()))?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(SourceFingerprint(hex(&hasher.finalize())))
        }
        FingerprintMode::Metadata => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("stat '{}'", path.display()))?;
            let mtime_ns = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            let mut h = Fnv128::new();
            h.write_str("metadata");
            h.write_u64(meta.len());
            h.write_bytes(&mtime_ns.to_le_bytes());
            Ok(SourceFingerprint(h.finish_hex()))
        }
    }
}

/// Fingerprint a stage configuration.
///
/// The value is serialized to JSON and hashed canonically: object keys are visited in sorted
/// order, so field declaration order and map insertion order never change the result.
pub fn fingerprint_config<T: serde::Serialize>(
    stage: &str,
    config: &T,
) -> FacelapseResult<ConfigFingerprint> {
    let value = serde_json::to_value(config).map_err(|e| {
        FacelapseError::validation(format!("serialize {stage} stage configuration: {e}"))
    })?;
    Ok(fingerprint_json(stage, &value))
}

pub fn fingerprint_json(stage: &str, value: &serde_json::Value) -> ConfigFingerprint {
    let mut h = Fnv128::new();
    h.write_str(stage);
    write_json_value(&mut h, value);
    ConfigFingerprint(h.finish_hex())
}

fn write_json_value(h: &mut Fnv128, v: &serde_json::Value) {
    match v {
        serde_json::Value::Null => h.write_u8(0),
        serde_json::Value::Bool(x) => {
            h.write_u8(1);
            h.write_u8(u8::from(*x));
        }
        serde_json::Value::Number(n) => {
            h.write_u8(2);
            h.write_str(&n.to_string());
        }
        serde_json::Value::String(s) => {
            h.write_u8(3);
            h.write_str(s);
        }
        serde_json::Value::Array(items) => {
            h.write_u8(4);
            h.write_u64(items.len() as u64);
            for item in items {
                write_json_value(h, item);
            }
        }
        serde_json::Value::Object(map) => {
            h.write_u8(5);
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            h.write_u64(keys.len() as u64);
            for k in keys {
                h.write_str(k);
                write_json_value(h, &map[k]);
            }
        }
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/cache/fingerprint.rs"]
mod tests;
