//! Run configuration.
//!
//! Every section has defaults, so a config file only needs the values that differ. Unknown keys
//! are rejected to catch typos early.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    cache::fingerprint::FingerprintMode,
    encode::ffmpeg::VideoConfig,
    foundation::{
        core::{Canvas, Point},
        error::{FacelapseError, FacelapseResult},
    },
    render::{CaptionStyle, encode::OutputFormat},
    select::SelectionRule,
    transform::solver::AlignmentTarget,
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacelapseConfig {
    pub paths: PathsConfig,
    pub alignment: AlignmentConfig,
    pub output: OutputConfig,
    pub caption: CaptionConfig,
    /// File name (with extension) to the rule that picks its face.
    pub face_selection_overrides: BTreeMap<String, SelectionRule>,
    pub cache: CacheConfig,
    pub detector: DetectorConfig,
    pub pipeline: PipelineConfig,
    pub video: VideoConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub cache: PathBuf,
    /// Diagnostics for images that could not be processed.
    pub error: PathBuf,
    pub frames: PathBuf,
    pub video: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            cache: PathBuf::from("output/cache"),
            error: PathBuf::from("output/error"),
            frames: PathBuf::from("output/frames"),
            video: PathBuf::from("output/facelapse.mp4"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignmentConfig {
    /// Distance between the eyes in output pixels.
    pub eye_target_separation: f64,
    /// Eye midpoint in output pixels, `[x, y]`.
    pub eye_target_position: [f64; 2],
    /// `[width, height]` in pixels.
    pub canvas_size: [u32; 2],
    pub tilt_degrees: f64,
    pub max_rotation_degrees: f64,
    pub warn_rotation_degrees: f64,
    /// Fill for canvas areas the photo does not cover (straight RGBA).
    pub background_rgba: [u8; 4],
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            eye_target_separation: 240.0,
            eye_target_position: [540.0, 560.0],
            canvas_size: [1080, 1350],
            tilt_degrees: 0.0,
            max_rotation_degrees: 45.0,
            warn_rotation_degrees: 30.0,
            background_rgba: [0, 0, 0, 255],
        }
    }
}

impl AlignmentConfig {
    pub fn canvas(&self) -> FacelapseResult<Canvas> {
        Canvas::new(self.canvas_size[0], self.canvas_size[1])
    }

    pub fn target(&self) -> FacelapseResult<AlignmentTarget> {
        Ok(AlignmentTarget {
            eye_separation: self.eye_target_separation,
            eye_midpoint: Point::new(self.eye_target_position[0], self.eye_target_position[1]),
            canvas: self.canvas()?,
            tilt_degrees: self.tilt_degrees,
            max_rotation_degrees: self.max_rotation_degrees,
            warn_rotation_degrees: self.warn_rotation_degrees,
        })
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            jpeg_quality: 92,
        }
    }
}

/// Placeholders understood by [`CaptionConfig::template`].
pub const CAPTION_PLACEHOLDERS: &[&str] = &["{file}", "{stem}", "{width}", "{height}"];

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub enabled: bool,
    /// Caption text. `{file}` is the file name, `{stem}` the file name without extension,
    /// `{width}`/`{height}` the size of the (oriented) source photo.
    pub template: String,
    /// Per-file caption text, used instead of `template`.
    pub overrides: BTreeMap<String, String>,
    pub style: CaptionStyle,
    /// Extra directories searched for `.ttf`/`.otf`/`.ttc` fonts.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            template: "{stem}".to_string(),
            overrides: BTreeMap::new(),
            style: CaptionStyle::default(),
            font_dirs: Vec::new(),
        }
    }
}

impl CaptionConfig {
    /// Caption for one photo, or `None` when captions are disabled.
    pub fn text_for(&self, file_name: &str, source_size: (u32, u32)) -> Option<String> {
        if !self.enabled {
            return None;
        }
        if let Some(text) = self.overrides.get(file_name) {
            return Some(text.clone());
        }
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        Some(
            self.template
                .replace("{file}", file_name)
                .replace("{stem}", stem)
                .replace("{width}", &source_size.0.to_string())
                .replace("{height}", &source_size.1.to_string()),
        )
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// How photos are identified: by content hash or by size and modification time.
    pub fingerprint: FingerprintMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fingerprint: FingerprintMode::Content,
        }
    }
}

/// Landmark detector backend.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum DetectorConfig {
    /// External program printing faces as JSON; see
    /// [`CommandDetector`](crate::CommandDetector).
    Command {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default = "default_detector_timeout_ms")]
        timeout_ms: u64,
        /// Bump to invalidate cached detections after changing the model.
        #[serde(default)]
        version: String,
    },
    /// Precomputed detections; see [`ManifestDetector`](crate::ManifestDetector).
    Manifest { path: PathBuf },
}

fn default_detector_timeout_ms() -> u64 {
    60_000
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::Command {
            program: PathBuf::from("facelapse-landmarks"),
            args: Vec::new(),
            timeout_ms: default_detector_timeout_ms(),
            version: String::new(),
        }
    }
}

/// What a per-image failure does to the rest of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop scheduling new images; in-flight images finish, nothing else is written.
    #[default]
    Abort,
    /// Record the failure and continue with the remaining images.
    Skip,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker threads; `0` means one per core.
    pub threads: usize,
    pub on_failure: FailurePolicy,
    /// Upper bound on one detector call regardless of backend.
    pub detection_timeout_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn detection_timeout(&self) -> Option<Duration> {
        self.detection_timeout_ms.map(Duration::from_millis)
    }
}

impl FacelapseConfig {
    pub fn validate(&self) -> FacelapseResult<()> {
        let a = &self.alignment;
        let canvas = a.canvas()?;
        if !(a.eye_target_separation.is_finite() && a.eye_target_separation > 0.0) {
            return Err(FacelapseError::validation(
                "alignment.eye_target_separation must be > 0",
            ));
        }
        if !a.eye_target_position.iter().all(|v| v.is_finite()) {
            return Err(FacelapseError::validation(
                "alignment.eye_target_position must be finite",
            ));
        }
        if !a.tilt_degrees.is_finite() {
            return Err(FacelapseError::validation(
                "alignment.tilt_degrees must be finite",
            ));
        }
        if !(a.max_rotation_degrees > 0.0 && a.max_rotation_degrees <= 180.0) {
            return Err(FacelapseError::validation(
                "alignment.max_rotation_degrees must be in (0, 180]",
            ));
        }
        if a.warn_rotation_degrees.is_nan() || a.warn_rotation_degrees < 0.0 {
            return Err(FacelapseError::validation(
                "alignment.warn_rotation_degrees must be >= 0",
            ));
        }
        if self.output.format == OutputFormat::Jpeg && a.background_rgba[3] != 255 {
            return Err(FacelapseError::validation(
                "jpeg output needs an opaque alignment.background_rgba",
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(FacelapseError::validation(
                "output.jpeg_quality must be in 1..=100",
            ));
        }
        self.caption.style.validate()?;
        match &self.detector {
            DetectorConfig::Command {
                program,
                timeout_ms,
                ..
            } => {
                if program.as_os_str().is_empty() {
                    return Err(FacelapseError::validation(
                        "detector.program must not be empty",
                    ));
                }
                if *timeout_ms == 0 {
                    return Err(FacelapseError::validation(
                        "detector.timeout_ms must be non-zero",
                    ));
                }
            }
            DetectorConfig::Manifest { path } => {
                if path.as_os_str().is_empty() {
                    return Err(FacelapseError::validation(
                        "detector.path must not be empty",
                    ));
                }
            }
        }
        if self.pipeline.detection_timeout_ms == Some(0) {
            return Err(FacelapseError::validation(
                "pipeline.detection_timeout_ms must be non-zero",
            ));
        }
        if self.video.enabled {
            self.video.validate()?;
            if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
                return Err(FacelapseError::validation(
                    "alignment.canvas_size must be even when video is enabled (yuv420p)",
                ));
            }
        }
        Ok(())
    }
}

/// Read and validate a JSON config file.
pub fn load_config(path: &Path) -> FacelapseResult<FacelapseConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config file '{}'", path.display()))?;
    let cfg: FacelapseConfig = serde_json::from_str(&text).map_err(|e| {
        FacelapseError::validation(format!("config file '{}': {e}", path.display()))
    })?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
