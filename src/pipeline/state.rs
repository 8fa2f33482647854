use std::path::PathBuf;

use crate::{
    detect::FaceCandidate,
    foundation::error::{ErrorKind, FacelapseError, FacelapseResult},
    transform::solver::AlignmentTransform,
};

/// Reportable summary of a per-image error.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FailureInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub diagnostic: Option<PathBuf>,
}

impl From<&FacelapseError> for FailureInfo {
    fn from(err: &FacelapseError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            diagnostic: err.diagnostic_path().map(|p| p.to_path_buf()),
        }
    }
}

/// Where one photo is in the pipeline.
///
/// The happy path is `Pending -> Detected -> Selected -> Transformed -> Rendered -> Written`.
/// Any failure moves the image to the terminal failure state of the stage it was in, and it
/// never receives an output index.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageState {
    Pending,
    Detected {
        candidates: Vec<FaceCandidate>,
    },
    Selected {
        face: FaceCandidate,
    },
    Transformed {
        face: FaceCandidate,
        transform: AlignmentTransform,
    },
    /// Final encoded frame, ready to be numbered and written.
    Rendered {
        frame: Vec<u8>,
    },
    Written {
        index: u64,
        path: PathBuf,
    },
    DetectionFailed(FailureInfo),
    SelectionFailed(FailureInfo),
    GeometryFailed(FailureInfo),
    RenderFailed(FailureInfo),
}

impl ImageState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Detected { .. } => "detected",
            Self::Selected { .. } => "selected",
            Self::Transformed { .. } => "transformed",
            Self::Rendered { .. } => "rendered",
            Self::Written { .. } => "written",
            Self::DetectionFailed(_) => "detection_failed",
            Self::SelectionFailed(_) => "selection_failed",
            Self::GeometryFailed(_) => "geometry_failed",
            Self::RenderFailed(_) => "render_failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Written { .. }) || self.failure().is_some()
    }

    pub fn failure(&self) -> Option<&FailureInfo> {
        match self {
            Self::DetectionFailed(f)
            | Self::SelectionFailed(f)
            | Self::GeometryFailed(f)
            | Self::RenderFailed(f) => Some(f),
            _ => None,
        }
    }

    pub fn detected(self, candidates: Vec<FaceCandidate>) -> FacelapseResult<Self> {
        match self {
            Self::Pending => Ok(Self::Detected { candidates }),
            other => Err(invalid("detected", &other)),
        }
    }

    /// Pick candidate `index` from the detected list.
    pub fn selected(self, index: usize) -> FacelapseResult<Self> {
        match self {
            Self::Detected { candidates } => candidates
                .get(index)
                .copied()
                .map(|face| Self::Selected { face })
                .ok_or_else(|| {
                    FacelapseError::validation(format!(
                        "selected candidate {index} out of {}",
                        candidates.len()
                    ))
                }),
            other => Err(invalid("selected", &other)),
        }
    }

    pub fn transformed(self, transform: AlignmentTransform) -> FacelapseResult<Self> {
        match self {
            Self::Selected { face } => Ok(Self::Transformed { face, transform }),
            other => Err(invalid("transformed", &other)),
        }
    }

    pub fn rendered(self, frame: Vec<u8>) -> FacelapseResult<Self> {
        match self {
            Self::Transformed { .. } => Ok(Self::Rendered { frame }),
            other => Err(invalid("rendered", &other)),
        }
    }

    pub fn written(self, index: u64, path: PathBuf) -> FacelapseResult<Self> {
        match self {
            Self::Rendered { .. } => Ok(Self::Written { index, path }),
            other => Err(invalid("written", &other)),
        }
    }

    /// Terminal failure state for an error raised while in this state. Terminal states are
    /// returned unchanged.
    pub fn fail(self, err: &FacelapseError) -> Self {
        let info = FailureInfo::from(err);
        match self {
            Self::Pending => Self::DetectionFailed(info),
            Self::Detected { .. } => Self::SelectionFailed(info),
            Self::Selected { .. } => Self::GeometryFailed(info),
            Self::Transformed { .. } | Self::Rendered { .. } => Self::RenderFailed(info),
            terminal => terminal,
        }
    }
}

fn invalid(to: &str, from: &ImageState) -> FacelapseError {
    FacelapseError::validation(format!(
        "invalid image state transition from {} to {to}",
        from.name()
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/state.rs"]
mod tests;
