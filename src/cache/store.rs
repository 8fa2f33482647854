use std::{
    io::Write as _,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;

use crate::{
    cache::fingerprint::{ConfigFingerprint, SourceFingerprint},
    foundation::{
        error::{FacelapseError, FacelapseResult},
        math::Fnv128,
    },
};

const MAGIC: &[u8; 8] = b"FLCACHE1";

/// Pipeline stage whose output is cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Candidate list from the landmark detector.
    Detect,
    /// Alignment transform for the selected face.
    Transform,
    /// Warped, cropped, encoded frame.
    Render,
    /// Captioned, encoded frame.
    Caption,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Detect, Stage::Transform, Stage::Render, Stage::Caption];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Transform => "transform",
            Self::Render => "render",
            Self::Caption => "caption",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Detect => 0,
            Self::Transform => 1,
            Self::Render => 2,
            Self::Caption => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one cached artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceFingerprint,
    pub stage: Stage,
    pub config: ConfigFingerprint,
}

impl CacheKey {
    pub fn new(source: SourceFingerprint, stage: Stage, config: ConfigFingerprint) -> Self {
        Self {
            source,
            stage,
            config,
        }
    }
}

/// A cache hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedArtifact {
    pub payload: Vec<u8>,
    pub stored_at: SystemTime,
}

/// Per-stage counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StageStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub corrupt: u64,
}

/// Snapshot of cache activity, indexed by [`Stage`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub detect: StageStats,
    pub transform: StageStats,
    pub render: StageStats,
    pub caption: StageStats,
}

impl StageStats {
    fn since(self, earlier: StageStats) -> StageStats {
        StageStats {
            hits: self.hits.saturating_sub(earlier.hits),
            misses: self.misses.saturating_sub(earlier.misses),
            writes: self.writes.saturating_sub(earlier.writes),
            corrupt: self.corrupt.saturating_sub(earlier.corrupt),
        }
    }
}

impl CacheStats {
    pub fn stage(&self, stage: Stage) -> StageStats {
        match stage {
            Stage::Detect => self.detect,
            Stage::Transform => self.transform,
            Stage::Render => self.render,
            Stage::Caption => self.caption,
        }
    }

    /// Activity recorded after the `earlier` snapshot was taken.
    pub fn since(&self, earlier: &CacheStats) -> CacheStats {
        CacheStats {
            detect: self.detect.since(earlier.detect),
            transform: self.transform.since(earlier.transform),
            render: self.render.since(earlier.render),
            caption: self.caption.since(earlier.caption),
        }
    }
}

#[derive(Debug, Default)]
struct AtomicStageStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    corrupt: AtomicU64,
}

impl AtomicStageStats {
    fn snapshot(&self) -> StageStats {
        StageStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            corrupt: self.corrupt.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe counters shared by cache implementations.
#[derive(Debug, Default)]
pub struct CacheCounters {
    stages: [AtomicStageStats; 4],
}

impl CacheCounters {
    fn hit(&self, stage: Stage) {
        self.stages[stage.index()].hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self, stage: Stage) {
        self.stages[stage.index()]
            .misses
            .fetch_add(1, Ordering::Relaxed);
    }

    fn write(&self, stage: Stage) {
        self.stages[stage.index()]
            .writes
            .fetch_add(1, Ordering::Relaxed);
    }

    fn corrupt(&self, stage: Stage) {
        self.stages[stage.index()]
            .corrupt
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            detect: self.stages[0].snapshot(),
            transform: self.stages[1].snapshot(),
            render: self.stages[2].snapshot(),
            caption: self.stages[3].snapshot(),
        }
    }
}

/// Stage artifact store shared by all pipeline workers.
///
/// `get` must never return an artifact stored under a different source or configuration
/// fingerprint, and must degrade unreadable entries to a miss. `put` must publish atomically.
pub trait ArtifactCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CachedArtifact>;

    fn put(&self, key: &CacheKey, payload: &[u8]) -> FacelapseResult<()>;

    /// Record that an artifact returned by `get` failed to decode at a higher layer.
    fn report_corrupt(&self, key: &CacheKey, reason: &str);

    fn stats(&self) -> CacheStats;
}

/// Typed JSON read on top of [`ArtifactCache::get`]; undecodable payloads count as corruption.
pub fn get_json<T: serde::de::DeserializeOwned>(
    cache: &dyn ArtifactCache,
    key: &CacheKey,
) -> Option<T> {
    let hit = cache.get(key)?;
    match serde_json::from_slice(&hit.payload) {
        Ok(v) => Some(v),
        Err(e) => {
            cache.report_corrupt(key, &format!("payload is not valid json: {e}"));
            None
        }
    }
}

pub fn put_json<T: serde::Serialize>(
    cache: &dyn ArtifactCache,
    key: &CacheKey,
    value: &T,
) -> FacelapseResult<()> {
    let payload = serde_json::to_vec(value).map_err(|e| {
        FacelapseError::validation(format!("serialize {} artifact: {e}", key.stage))
    })?;
    cache.put(key, &payload)
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct EnvelopeHeader {
    stage: Stage,
    source: SourceFingerprint,
    config: ConfigFingerprint,
    stored_at_ms: u64,
    payload_len: u64,
    payload_digest: String,
}

/// Filesystem-backed cache.
///
/// Layout: `<root>/<stage>/<source[..2]>/<source>-<config>.bin`. Each file is an envelope of
/// magic bytes, a length-prefixed JSON header, and the payload. Stale entries for older
/// configurations are left in place and simply never addressed again.
#[derive(Debug)]
pub struct FsArtifactCache {
    root: PathBuf,
    counters: CacheCounters,
    tmp_seq: AtomicU64,
}

impl FsArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counters: CacheCounters::default(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        let source = key.source.as_str();
        let shard = source.get(..2).unwrap_or("__");
        self.root
            .join(key.stage.as_str())
            .join(shard)
            .join(format!("{source}-{}.bin", key.config.as_str()))
    }

    /// Remove every cached artifact.
    pub fn clear(&self) -> FacelapseResult<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove cache directory '{}'", self.root.display()))
                .into()),
        }
    }

    fn read_envelope(&self, key: &CacheKey, bytes: &[u8]) -> Result<CachedArtifact, String> {
        let rest = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| "bad magic".to_string())?;
        if rest.len() < 4 {
            return Err("truncated header length".to_string());
        }
        let (len_bytes, rest) = rest.split_at(4);
        let header_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
            as usize;
        if rest.len() < header_len {
            return Err("truncated header".to_string());
        }
        let (header_bytes, payload) = rest.split_at(header_len);
        let header: EnvelopeHeader =
            serde_json::from_slice(header_bytes).map_err(|e| format!("bad header: {e}"))?;

        if header.stage != key.stage || header.source != key.source || header.config != key.config
        {
            return Err("header does not match the requested key".to_string());
        }
        if header.payload_len != payload.len() as u64 {
            return Err(format!(
                "payload length {} does not match header {}",
                payload.len(),
                header.payload_len
            ));
        }
        if header.payload_digest != payload_digest(payload) {
            return Err("payload digest mismatch".to_string());
        }

        Ok(CachedArtifact {
            payload: payload.to_vec(),
            stored_at: UNIX_EPOCH + Duration::from_millis(header.stored_at_ms),
        })
    }

    fn temp_path_for(&self, final_path: &Path) -> PathBuf {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let name = final_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("artifact");
        final_path.with_file_name(format!(".{name}.tmp-{}-{seq}", std::process::id()))
    }
}

impl ArtifactCache for FsArtifactCache {
    fn get(&self, key: &CacheKey) -> Option<CachedArtifact> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.counters.miss(key.stage);
                return None;
            }
            Err(e) => {
                self.report_corrupt(key, &format!("read failed: {e}"));
                return None;
            }
        };

        match self.read_envelope(key, &bytes) {
            Ok(artifact) => {
                self.counters.hit(key.stage);
                tracing::debug!(stage = %key.stage, path = %path.display(), "cache hit");
                Some(artifact)
            }
            Err(reason) => {
                self.report_corrupt(key, &reason);
                None
            }
        }
    }

    fn put(&self, key: &CacheKey, payload: &[u8]) -> FacelapseResult<()> {
        let path = self.path_for(key);
        let parent = path
            .parent()
            .ok_or_else(|| FacelapseError::validation("cache path has no parent directory"))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create cache directory '{}'", parent.display()))?;

        let stored_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let header = EnvelopeHeader {
            stage: key.stage,
            source: key.source.clone(),
            config: key.config.clone(),
            stored_at_ms,
            payload_len: payload.len() as u64,
            payload_digest: payload_digest(payload),
        };
        let header_bytes = serde_json::to_vec(&header)
            .map_err(|e| FacelapseError::validation(format!("serialize cache header: {e}")))?;
        let header_len = u32::try_from(header_bytes.len())
            .map_err(|_| FacelapseError::validation("cache header too large"))?;

        let tmp = self.temp_path_for(&path);
        let write = || -> std::io::Result<()> {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(MAGIC)?;
            f.write_all(&header_len.to_le_bytes())?;
            f.write_all(&header_bytes)?;
            f.write_all(payload)?;
            f.sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("write cache artifact '{}'", tmp.display()))
                .into());
        }
        // Readers only ever see the old file or the complete new one.
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("publish cache artifact '{}'", path.display()))
                .into());
        }

        self.counters.write(key.stage);
        Ok(())
    }

    fn report_corrupt(&self, key: &CacheKey, reason: &str) {
        self.counters.corrupt(key.stage);
        self.counters.miss(key.stage);
        let err = FacelapseError::cache_corruption(format!(
            "{} artifact for {}: {reason}",
            key.stage, key.source
        ));
        tracing::warn!(path = %self.path_for(key).display(), "{err}; recomputing");
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

/// Cache used when caching is disabled: every lookup misses and nothing is stored.
#[derive(Debug, Default)]
pub struct NullArtifactCache {
    counters: CacheCounters,
}

impl ArtifactCache for NullArtifactCache {
    fn get(&self, key: &CacheKey) -> Option<CachedArtifact> {
        self.counters.miss(key.stage);
        None
    }

    fn put(&self, _key: &CacheKey, _payload: &[u8]) -> FacelapseResult<()> {
        Ok(())
    }

    fn report_corrupt(&self, key: &CacheKey, _reason: &str) {
        self.counters.corrupt(key.stage);
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

fn payload_digest(payload: &[u8]) -> String {
    let mut h = Fnv128::new();
    h.write_bytes(payload);
    h.finish_hex()
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
