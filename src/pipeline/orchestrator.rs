use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        mpsc,
    },
    time::Duration,
};

use rayon::prelude::*;

use crate::{
    cache::{
        fingerprint::{ConfigFingerprint, fingerprint_json},
        store::{
            ArtifactCache, CacheKey, CacheStats, FsArtifactCache, NullArtifactCache, Stage,
            get_json, put_json,
        },
    },
    config::{DetectorConfig, FacelapseConfig, FailurePolicy},
    detect::{
        DetectRequest, FaceCandidate, FaceDetector, command::CommandDetector, detect_faces,
        manifest::ManifestDetector, timeout::TimeoutDetector,
    },
    encode::ffmpeg::{encode_frames_dir, is_ffmpeg_available},
    foundation::{
        core::FrameRGBA,
        error::{ErrorKind, FacelapseError, FacelapseResult},
    },
    input::{
        decode::{decode_image_bytes, decode_image_file},
        scan::{ImageRef, scan_input_dir},
    },
    pipeline::{
        output::{clear_numbered_frames, frame_path, reset_dir, write_frame},
        sequencer::FrameSequencer,
        state::{FailureInfo, ImageState},
    },
    render::{
        FrameRenderer,
        cpu::CpuRenderer,
        encode::{OutputFormat, encode_frame},
    },
    select::{FaceRanking, SelectionRules, diagnostic::write_selection_diagnostic, select_face},
    transform::solver::{AlignmentTarget, AlignmentTransform, solve_alignment},
};

/// Bumped whenever warp output changes for identical inputs, so stale render artifacts are
/// never reused.
const RENDERER_REVISION: &str = "vello_cpu-affine-1";

/// Cooperative cancellation shared with the caller. Checked before each image starts; an image
/// already in flight runs to completion (its cache writes are atomic either way).
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one input photo.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Written {
        index: u64,
        path: PathBuf,
    },
    /// Failed; the run continued without it.
    Skipped {
        state: &'static str,
        failure: FailureInfo,
    },
    /// Failed and, under the abort policy, stopped the run.
    Aborted {
        state: &'static str,
        failure: FailureInfo,
    },
    /// Never started, or its result was discarded because the run stopped first.
    NotProcessed,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ImageReport {
    pub file: String,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// Stopped by the first failing image in input order.
    Aborted {
        file: String,
        kind: ErrorKind,
    },
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoStatus {
    Disabled,
    NotEncoded { reason: String },
    Written { path: PathBuf },
    Failed { failure: FailureInfo },
}

/// Result of a run. `images` is in input sort order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub images: Vec<ImageReport>,
    pub cache: CacheStats,
    /// Detector invocations during this run (cache hits excluded).
    pub detections: u64,
    pub video: VideoStatus,
}

impl RunReport {
    pub fn frames(&self) -> impl Iterator<Item = (u64, &str, &Path)> + '_ {
        self.images.iter().filter_map(|r| match &r.outcome {
            ImageOutcome::Written { index, path } => Some((*index, r.file.as_str(), path.as_path())),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FailureInfo)> + '_ {
        self.images.iter().filter_map(|r| match &r.outcome {
            ImageOutcome::Skipped { failure, .. } | ImageOutcome::Aborted { failure, .. } => {
                Some((r.file.as_str(), failure))
            }
            _ => None,
        })
    }

    pub fn not_processed(&self) -> impl Iterator<Item = &str> + '_ {
        self.images
            .iter()
            .filter(|r| r.outcome == ImageOutcome::NotProcessed)
            .map(|r| r.file.as_str())
    }

    pub fn frame_count(&self) -> usize {
        self.frames().count()
    }

    /// The run finished every image (some may have been skipped) and, if requested, the video
    /// was written.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed && !matches!(self.video, VideoStatus::Failed { .. })
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct DetectArtifact {
    source_size: (u32, u32),
    candidates: Vec<FaceCandidate>,
}

/// Per-image scratch state that is not part of [`ImageState`]: lazily decoded pixels and
/// fingerprints derived along the way.
struct ImageWork<'a> {
    image: &'a ImageRef,
    frame: Option<Arc<FrameRGBA>>,
    source_size: Option<(u32, u32)>,
    transform_fp: Option<ConfigFingerprint>,
}

impl<'a> ImageWork<'a> {
    fn new(image: &'a ImageRef) -> Self {
        Self {
            image,
            frame: None,
            source_size: None,
            transform_fp: None,
        }
    }

    fn frame(&mut self) -> FacelapseResult<Arc<FrameRGBA>> {
        if let Some(frame) = &self.frame {
            return Ok(Arc::clone(frame));
        }
        let frame = Arc::new(decode_image_file(&self.image.path)?);
        self.source_size = Some((frame.width, frame.height));
        self.frame = Some(Arc::clone(&frame));
        Ok(frame)
    }

    fn source_size(&mut self) -> FacelapseResult<(u32, u32)> {
        match self.source_size {
            Some(size) => Ok(size),
            None => {
                let frame = self.frame()?;
                Ok((frame.width, frame.height))
            }
        }
    }
}

/// The alignment pipeline: detect, select, solve, render, and number frames.
///
/// Collaborators are injected so tests and embedders can swap the detector, renderer, or cache.
pub struct Pipeline {
    config: FacelapseConfig,
    target: AlignmentTarget,
    detector: Arc<dyn FaceDetector>,
    renderer: Arc<dyn FrameRenderer>,
    cache: Arc<dyn ArtifactCache>,
    rules: SelectionRules,
    detections: AtomicU64,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new(
        config: FacelapseConfig,
        detector: Arc<dyn FaceDetector>,
        renderer: Arc<dyn FrameRenderer>,
        cache: Arc<dyn ArtifactCache>,
    ) -> FacelapseResult<Self> {
        config.validate()?;
        let target = config.alignment.target()?;
        let detector: Arc<dyn FaceDetector> = match config.pipeline.detection_timeout() {
            Some(timeout) => Arc::new(TimeoutDetector::new(detector, timeout)),
            None => detector,
        };
        let rules = SelectionRules::from_config(&config.face_selection_overrides);
        Ok(Self {
            config,
            target,
            detector,
            renderer,
            cache,
            rules,
            detections: AtomicU64::new(0),
            cancel: CancelToken::new(),
        })
    }

    /// Build the detector, renderer, and cache described by `config`.
    pub fn from_config(config: FacelapseConfig) -> FacelapseResult<Self> {
        config.validate()?;
        let detector: Arc<dyn FaceDetector> = match &config.detector {
            DetectorConfig::Command {
                program,
                args,
                timeout_ms,
                version,
            } => {
                let mut d = CommandDetector::new(
                    program.clone(),
                    args.clone(),
                    Duration::from_millis(*timeout_ms),
                );
                d.version = version.clone();
                Arc::new(d)
            }
            DetectorConfig::Manifest { path } => Arc::new(ManifestDetector::load(path)?),
        };
        let renderer = Arc::new(CpuRenderer::new(&config.caption.font_dirs));
        let cache: Arc<dyn ArtifactCache> = if config.cache.enabled {
            Arc::new(FsArtifactCache::new(config.paths.cache.clone()))
        } else {
            Arc::new(NullArtifactCache::default())
        };
        Self::new(config, detector, renderer, cache)
    }

    /// Bind (or replace) the ranking used for `file_name`.
    pub fn with_selection_rule(
        mut self,
        file_name: impl Into<String>,
        rule: Arc<dyn FaceRanking>,
    ) -> Self {
        self.rules.insert(file_name, rule);
        self
    }

    pub fn config(&self) -> &FacelapseConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn ArtifactCache> {
        &self.cache
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Full run: scan the input directory, reset the error directory and stale frames, process
    /// every photo, then assemble the video if enabled and the run completed.
    pub fn run(&self) -> FacelapseResult<RunReport> {
        let cfg = &self.config;
        if cfg.video.enabled && !is_ffmpeg_available(&cfg.video.program()) {
            return Err(FacelapseError::validation(format!(
                "video is enabled but '{}' could not be run; install ffmpeg or set video.enabled \
                 to false",
                cfg.video.program().display()
            )));
        }

        let images = scan_input_dir(&cfg.paths.input, cfg.cache.fingerprint)?;
        tracing::info!(images = images.len(), input = %cfg.paths.input.display(), "scanned input");

        reset_dir(&cfg.paths.error)?;
        let stale = clear_numbered_frames(&cfg.paths.frames)?;
        if stale > 0 {
            tracing::debug!(removed = stale, "removed frames from a previous run");
        }

        let mut report = self.process_images(&images)?;

        report.video = if !cfg.video.enabled {
            VideoStatus::Disabled
        } else if report.outcome != RunOutcome::Completed {
            VideoStatus::NotEncoded {
                reason: "the run did not complete".to_string(),
            }
        } else if report.frame_count() == 0 {
            VideoStatus::NotEncoded {
                reason: "no frames were produced".to_string(),
            }
        } else {
            match encode_frames_dir(
                &cfg.video,
                &cfg.paths.frames,
                cfg.output.format,
                &cfg.paths.video,
            ) {
                Ok(()) => {
                    tracing::info!(path = %cfg.paths.video.display(), "video written");
                    VideoStatus::Written {
                        path: cfg.paths.video.clone(),
                    }
                }
                Err(err) => {
                    tracing::error!("{err}");
                    VideoStatus::Failed {
                        failure: FailureInfo::from(&err),
                    }
                }
            }
        };
        Ok(report)
    }

    /// Process `images` (already in sort order) and write their frames as `1.<ext>, 2.<ext>, …`
    /// into the frames directory. Does not clear directories or encode video.
    pub fn process_images(&self, images: &[ImageRef]) -> FacelapseResult<RunReport> {
        let frames_dir = self.config.paths.frames.as_path();
        std::fs::create_dir_all(frames_dir).map_err(|e| {
            FacelapseError::validation(format!(
                "create frames directory '{}': {e}",
                frames_dir.display()
            ))
        })?;
        let ext = self.config.output.format.extension();
        let policy = self.config.pipeline.on_failure;
        let pool = build_thread_pool(self.config.pipeline.threads)?;
        let detect_fp = self.detect_fingerprint();
        let detections_before = self.detections.load(Ordering::Relaxed);
        let cache_before = self.cache.stats();

        // Lowest position that stopped the run; workers skip anything after it.
        let halt = AtomicUsize::new(usize::MAX);
        let mut outcomes: Vec<Option<ImageOutcome>> = vec![None; images.len()];
        let mut sequencer = FrameSequencer::<ImageState>::new();
        let mut halt_at: Option<usize> = None;
        let mut aborted_by: Option<(usize, ErrorKind)> = None;

        std::thread::scope(|s| {
            let (tx, rx) = mpsc::channel::<(usize, Option<ImageState>)>();
            let (pool, halt, detect_fp) = (&pool, &halt, &detect_fp);
            s.spawn(move || {
                pool.install(|| {
                    images
                        .par_iter()
                        .enumerate()
                        .for_each_with(tx, |tx, (pos, image)| {
                            if pos > halt.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
                                let _ = tx.send((pos, None));
                                return;
                            }
                            let state = self.run_image(image, detect_fp);
                            let _ = tx.send((pos, Some(state)));
                        });
                });
            });

            for (pos, state) in rx {
                let file = images[pos].file_name.as_str();
                let released = match state {
                    None => {
                        outcomes[pos] = Some(ImageOutcome::NotProcessed);
                        halt_at = Some(halt_at.map_or(pos, |h| h.min(pos)));
                        sequencer.complete(pos, None)
                    }
                    Some(state @ ImageState::Rendered { .. }) => {
                        sequencer.complete(pos, Some(state))
                    }
                    Some(state) => {
                        let failure = state.failure().cloned().unwrap_or_else(|| FailureInfo {
                            kind: ErrorKind::Other,
                            message: format!("image stopped in state {}", state.name()),
                            diagnostic: None,
                        });
                        match policy {
                            FailurePolicy::Skip => {
                                tracing::warn!(file, kind = %failure.kind, "skipping image: {}", failure.message);
                                outcomes[pos] = Some(ImageOutcome::Skipped {
                                    state: state.name(),
                                    failure,
                                });
                            }
                            FailurePolicy::Abort => {
                                tracing::error!(file, kind = %failure.kind, "aborting run: {}", failure.message);
                                halt.fetch_min(pos, Ordering::SeqCst);
                                halt_at = Some(halt_at.map_or(pos, |h| h.min(pos)));
                                if aborted_by.is_none_or(|(p, _)| pos < p) {
                                    aborted_by = Some((pos, failure.kind));
                                }
                                outcomes[pos] = Some(ImageOutcome::Aborted {
                                    state: state.name(),
                                    failure,
                                });
                            }
                        }
                        sequencer.complete(pos, None)
                    }
                };

                for item in released {
                    if halt_at.is_some_and(|h| item.position >= h) {
                        outcomes[item.position] = Some(ImageOutcome::NotProcessed);
                        continue;
                    }
                    let ImageState::Rendered { frame } = &item.value else {
                        continue;
                    };
                    let path = frame_path(frames_dir, item.index, ext);
                    let written = write_frame(&path, frame)
                        .and_then(|()| item.value.written(item.index, path));
                    outcomes[item.position] = Some(match written {
                        Ok(ImageState::Written { index, path }) => {
                            tracing::debug!(file = %images[item.position].file_name, index, "frame written");
                            ImageOutcome::Written { index, path }
                        }
                        Ok(other) => ImageOutcome::Aborted {
                            state: other.name(),
                            failure: FailureInfo {
                                kind: ErrorKind::Other,
                                message: "frame was not written".to_string(),
                                diagnostic: None,
                            },
                        },
                        Err(err) => {
                            tracing::error!("{err}");
                            halt.fetch_min(item.position, Ordering::SeqCst);
                            halt_at = Some(halt_at.map_or(item.position, |h| h.min(item.position)));
                            if aborted_by.is_none_or(|(p, _)| item.position < p) {
                                aborted_by = Some((item.position, err.kind()));
                            }
                            ImageOutcome::Aborted {
                                state: "render_failed",
                                failure: FailureInfo::from(&err),
                            }
                        }
                    });
                }
            }
        });

        // Only the earliest failure stopped the run; later ones were merely dropped.
        if let Some((stop, _)) = aborted_by {
            for outcome in outcomes.iter_mut().skip(stop + 1) {
                *outcome = match outcome.take() {
                    Some(ImageOutcome::Aborted { state, failure }) => {
                        Some(ImageOutcome::Skipped { state, failure })
                    }
                    other => other,
                };
            }
        }

        let images_report: Vec<ImageReport> = images
            .iter()
            .zip(outcomes)
            .map(|(image, outcome)| ImageReport {
                file: image.file_name.clone(),
                outcome: outcome.unwrap_or(ImageOutcome::NotProcessed),
            })
            .collect();

        let outcome = match aborted_by {
            Some((pos, kind)) => RunOutcome::Aborted {
                file: images[pos].file_name.clone(),
                kind,
            },
            None if halt_at.is_some() => RunOutcome::Cancelled,
            None => RunOutcome::Completed,
        };

        let report = RunReport {
            outcome,
            images: images_report,
            cache: self.cache.stats().since(&cache_before),
            detections: self.detections.load(Ordering::Relaxed) - detections_before,
            video: VideoStatus::Disabled,
        };
        tracing::info!(
            frames = report.frame_count(),
            failures = report.failures().count(),
            detections = report.detections,
            "pipeline finished"
        );
        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(file = %image.file_name))]
    fn run_image(&self, image: &ImageRef, detect_fp: &ConfigFingerprint) -> ImageState {
        let mut work = ImageWork::new(image);
        let mut state = ImageState::Pending;
        while !state.is_terminal() && !matches!(state, ImageState::Rendered { .. }) {
            let before = state.clone();
            state = match self.advance(state, &mut work, detect_fp) {
                Ok(next) => next,
                Err(err) => {
                    tracing::debug!(state = before.name(), kind = %err.kind(), "{err}");
                    before.fail(&err)
                }
            };
        }
        state
    }

    fn advance(
        &self,
        state: ImageState,
        work: &mut ImageWork<'_>,
        detect_fp: &ConfigFingerprint,
    ) -> FacelapseResult<ImageState> {
        match state {
            ImageState::Pending => {
                let candidates = self.detect_stage(work, detect_fp)?;
                ImageState::Pending.detected(candidates)
            }
            ImageState::Detected { candidates } => {
                let index = self.select_stage(work, &candidates)?;
                ImageState::Detected { candidates }.selected(index)
            }
            ImageState::Selected { face } => {
                let transform = self.transform_stage(work, &face, detect_fp)?;
                ImageState::Selected { face }.transformed(transform)
            }
            ImageState::Transformed { face, transform } => {
                let frame = self.render_stage(work, &transform)?;
                ImageState::Transformed { face, transform }.rendered(frame)
            }
            other => Ok(other),
        }
    }

    fn detect_stage(
        &self,
        work: &mut ImageWork<'_>,
        detect_fp: &ConfigFingerprint,
    ) -> FacelapseResult<Vec<FaceCandidate>> {
        let key = CacheKey::new(
            work.image.fingerprint.clone(),
            Stage::Detect,
            detect_fp.clone(),
        );
        if let Some(hit) = get_json::<DetectArtifact>(self.cache.as_ref(), &key) {
            work.source_size = Some(hit.source_size);
            return Ok(hit.candidates);
        }

        let frame = work.frame()?;
        self.detections.fetch_add(1, Ordering::Relaxed);
        let req = DetectRequest {
            image: work.image.clone(),
            frame: Arc::clone(&frame),
        };
        let candidates = detect_faces(self.detector.as_ref(), &req)?;
        self.store_json(
            &key,
            &DetectArtifact {
                source_size: (frame.width, frame.height),
                candidates: candidates.clone(),
            },
        );
        Ok(candidates)
    }

    fn select_stage(
        &self,
        work: &mut ImageWork<'_>,
        candidates: &[FaceCandidate],
    ) -> FacelapseResult<usize> {
        match select_face(candidates, self.rules.get(&work.image.file_name)) {
            Err(FacelapseError::AmbiguousFaceSelection { candidates: n, .. }) => {
                let diagnostic = work.frame().and_then(|frame| {
                    write_selection_diagnostic(
                        &frame,
                        candidates,
                        &self.config.paths.error,
                        &work.image.file_name,
                    )
                });
                let diagnostic = match diagnostic {
                    Ok(path) => Some(path),
                    Err(err) => {
                        tracing::warn!("could not write selection diagnostic: {err}");
                        None
                    }
                };
                Err(FacelapseError::AmbiguousFaceSelection {
                    candidates: n,
                    diagnostic,
                })
            }
            other => other,
        }
    }

    fn transform_stage(
        &self,
        work: &mut ImageWork<'_>,
        face: &FaceCandidate,
        detect_fp: &ConfigFingerprint,
    ) -> FacelapseResult<AlignmentTransform> {
        let rule = self.rules.get(&work.image.file_name).map(|r| r.name());
        let fp = fingerprint_json(
            Stage::Transform.as_str(),
            &serde_json::json!({
                "detect": detect_fp,
                "rule": rule,
                "target": self.target,
            }),
        );
        work.transform_fp = Some(fp.clone());

        let key = CacheKey::new(work.image.fingerprint.clone(), Stage::Transform, fp);
        if let Some(transform) = get_json::<AlignmentTransform>(self.cache.as_ref(), &key) {
            return Ok(transform);
        }
        let transform = solve_alignment(face.left_eye, face.right_eye, &self.target)?;
        self.store_json(&key, &transform);
        Ok(transform)
    }

    /// Produce the final encoded frame: captioned and encoded in the output format.
    fn render_stage(
        &self,
        work: &mut ImageWork<'_>,
        transform: &AlignmentTransform,
    ) -> FacelapseResult<Vec<u8>> {
        let transform_fp = work
            .transform_fp
            .clone()
            .ok_or_else(|| FacelapseError::render("render stage reached without a transform"))?;
        let a = &self.config.alignment;
        let render_fp = fingerprint_json(
            Stage::Render.as_str(),
            &serde_json::json!({
                "transform": transform_fp,
                "canvas": self.target.canvas,
                "background": a.background_rgba,
                "renderer": RENDERER_REVISION,
            }),
        );

        let caption = &self.config.caption;
        let size = if caption.enabled {
            work.source_size()?
        } else {
            (0, 0)
        };
        let text = caption.text_for(&work.image.file_name, size);
        let output = &self.config.output;
        let caption_fp = fingerprint_json(
            Stage::Caption.as_str(),
            &serde_json::json!({
                "render": render_fp,
                "text": text,
                "style": text.as_ref().map(|_| &caption.style),
                "font_dirs": text.as_ref().map(|_| &caption.font_dirs),
                "format": output.format,
                "jpeg_quality": output.jpeg_quality,
            }),
        );

        let source = work.image.fingerprint.clone();
        let caption_key = CacheKey::new(source.clone(), Stage::Caption, caption_fp);
        if let Some(hit) = self.cache.get(&caption_key) {
            return Ok(hit.payload);
        }

        let render_key = CacheKey::new(source, Stage::Render, render_fp);
        let base = self.warped_frame(work, &render_key, transform)?;
        let frame = match &text {
            Some(text) => self.renderer.caption(base, text, &caption.style)?,
            None => base,
        };
        let bytes = encode_frame(frame, output.format, output.jpeg_quality)?;
        self.store(&caption_key, &bytes);
        Ok(bytes)
    }

    /// Warped, uncaptioned frame (straight alpha), from the cache or freshly rendered.
    fn warped_frame(
        &self,
        work: &mut ImageWork<'_>,
        key: &CacheKey,
        transform: &AlignmentTransform,
    ) -> FacelapseResult<FrameRGBA> {
        let canvas = self.target.canvas;
        if let Some(hit) = self.cache.get(key) {
            match decode_image_bytes(&hit.payload) {
                Ok(frame) if frame.width == canvas.width && frame.height == canvas.height => {
                    return Ok(frame);
                }
                Ok(frame) => self.cache.report_corrupt(
                    key,
                    &format!("cached frame is {}x{}", frame.width, frame.height),
                ),
                Err(err) => self.cache.report_corrupt(key, &err.to_string()),
            }
        }

        let source = work.frame()?;
        let warped = self
            .renderer
            .warp(
                &source,
                transform,
                canvas,
                self.config.alignment.background_rgba,
            )?
            .into_straight();
        let png = encode_frame(warped.clone(), OutputFormat::Png, 100)?;
        self.store(key, &png);
        Ok(warped)
    }

    fn detect_fingerprint(&self) -> ConfigFingerprint {
        fingerprint_json(
            Stage::Detect.as_str(),
            &serde_json::json!({
                "detector": self.detector.fingerprint_source(),
                "orientation": "exif",
            }),
        )
    }

    fn store(&self, key: &CacheKey, payload: &[u8]) {
        if let Err(err) = self.cache.put(key, payload) {
            tracing::warn!(stage = %key.stage, "cache write failed: {err}");
        }
    }

    fn store_json<T: serde::Serialize>(&self, key: &CacheKey, value: &T) {
        if let Err(err) = put_json(self.cache.as_ref(), key, value) {
            tracing::warn!(stage = %key.stage, "cache write failed: {err}");
        }
    }
}

fn build_thread_pool(threads: usize) -> FacelapseResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("facelapse-{i}"));
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    builder
        .build()
        .map_err(|e| FacelapseError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
