//! Detection adapter: wraps an external landmark detector behind [`FaceDetector`].

pub(crate) mod command;
pub(crate) mod manifest;
pub(crate) mod timeout;

use std::sync::Arc;

use crate::{
    foundation::{
        core::{BoundingBox, FrameRGBA, Point, Vec2},
        error::FacelapseResult,
    },
    input::scan::ImageRef,
};

/// One detected face: bounding box plus the two eye centers.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FaceCandidate {
    pub bbox: BoundingBox,
    pub left_eye: Point,
    pub right_eye: Point,
}

impl FaceCandidate {
    /// Eyes ordered by image x coordinate, so `left_eye` is the left-most eye in the picture.
    ///
    /// Detectors disagree on whether "left" means the subject's or the viewer's left; levelling
    /// relies on the viewer's convention.
    pub fn normalized(self) -> Self {
        if self.left_eye.x > self.right_eye.x {
            Self {
                left_eye: self.right_eye,
                right_eye: self.left_eye,
                ..self
            }
        } else {
            self
        }
    }

    pub fn eye_vector(&self) -> Vec2 {
        self.right_eye - self.left_eye
    }

    pub fn eye_midpoint(&self) -> Point {
        self.left_eye.midpoint(self.right_eye)
    }
}

/// Everything a detector may look at for one photo.
#[derive(Clone, Debug)]
pub struct DetectRequest {
    pub image: ImageRef,
    /// Decoded, EXIF-oriented pixels (straight alpha).
    pub frame: Arc<FrameRGBA>,
}

/// Pluggable landmark detector.
///
/// Implementations must be deterministic for a fixed image and configuration. Failures (model
/// unavailable, timeout, malformed output) are reported as
/// [`FacelapseError::Detection`](crate::FacelapseError::Detection).
pub trait FaceDetector: Send + Sync {
    fn detect(&self, req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>>;

    /// Stable description of the detector and its configuration; part of the detection-stage
    /// cache fingerprint.
    fn fingerprint_source(&self) -> String;
}

impl<T: FaceDetector + ?Sized> FaceDetector for Arc<T> {
    fn detect(&self, req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>> {
        (**self).detect(req)
    }

    fn fingerprint_source(&self) -> String {
        (**self).fingerprint_source()
    }
}

/// Run `detector` and normalize eye order of every candidate, preserving detector order.
#[tracing::instrument(skip_all, fields(file = %req.image.file_name))]
pub fn detect_faces(
    detector: &dyn FaceDetector,
    req: &DetectRequest,
) -> FacelapseResult<Vec<FaceCandidate>> {
    let faces = detector.detect(req)?;
    tracing::debug!(faces = faces.len(), "detector returned");
    Ok(faces.into_iter().map(FaceCandidate::normalized).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/detect/mod.rs"]
mod tests;
