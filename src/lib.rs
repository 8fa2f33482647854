//! Facelapse turns a folder of portrait photos into an eye-aligned timelapse.
//!
//! Every photo goes through the same stages:
//!
//! - detect face candidates with an external landmark detector ([`FaceDetector`])
//! - select exactly one face, using a per-file [`SelectionRule`] when there are several
//! - solve the similarity transform that puts the eyes on the configured target
//! - warp onto the output canvas, overlay an optional caption, and encode the frame
//!
//! Frames are numbered `1..=N` in natural file-name order with no gaps, and every stage output
//! is cached under the source content fingerprint plus the stage configuration fingerprint, so
//! an unchanged rerun performs no detection and writes byte-identical frames. The [`Pipeline`]
//! then hands the frames directory to ffmpeg.
#![forbid(unsafe_code)]

mod cache;
mod detect;
mod encode;
mod foundation;
mod input;
mod pipeline;
mod render;
mod select;
mod transform;

pub mod config;

pub use crate::foundation::core::{Affine, BoundingBox, Canvas, FrameRGBA, Point, Rect, Vec2};
pub use crate::foundation::error::{ErrorKind, FacelapseError, FacelapseResult};

pub use crate::cache::fingerprint::{
    ConfigFingerprint, FingerprintMode, SourceFingerprint, fingerprint_config, fingerprint_file,
};
pub use crate::cache::store::{
    ArtifactCache, CacheKey, CacheStats, CachedArtifact, FsArtifactCache, NullArtifactCache,
    Stage, StageStats,
};
pub use crate::config::{
    AlignmentConfig, CacheConfig, CaptionConfig, DetectorConfig, FacelapseConfig, FailurePolicy,
    OutputConfig, PathsConfig, PipelineConfig, load_config,
};
pub use crate::detect::command::CommandDetector;
pub use crate::detect::manifest::ManifestDetector;
pub use crate::detect::timeout::TimeoutDetector;
pub use crate::detect::{DetectRequest, FaceCandidate, FaceDetector, detect_faces};
pub use crate::encode::ffmpeg::{VideoConfig, build_args, encode_frames_dir, is_ffmpeg_available};
pub use crate::input::decode::{decode_image_bytes, decode_image_file};
pub use crate::input::natural::natural_cmp;
pub use crate::input::scan::{ImageRef, SUPPORTED_EXTENSIONS, scan_input_dir};
pub use crate::pipeline::orchestrator::{
    CancelToken, ImageOutcome, ImageReport, Pipeline, RunOutcome, RunReport, VideoStatus,
};
pub use crate::pipeline::output::frame_path;
pub use crate::pipeline::sequencer::{FrameSequencer, Sequenced};
pub use crate::pipeline::state::{FailureInfo, ImageState};
pub use crate::render::caption::TextAnchor;
pub use crate::render::cpu::CpuRenderer;
pub use crate::render::encode::{OutputFormat, encode_frame};
pub use crate::render::{CaptionStyle, FrameRenderer};
pub use crate::select::diagnostic::write_selection_diagnostic;
pub use crate::select::{Anchor, FaceRanking, Order, SelectionRule, SelectionRules, select_face};
pub use crate::transform::solver::{
    AlignmentTarget, AlignmentTransform, MIN_EYE_SEPARATION, solve_alignment,
};
