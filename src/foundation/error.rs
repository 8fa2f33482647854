use std::path::PathBuf;

/// Convenience result type used across facelapse.
pub type FacelapseResult<T> = Result<T, FacelapseError>;

/// Top-level error taxonomy.
///
/// The per-image kinds (`Detection`, `NoFaceDetected`, `AmbiguousFaceSelection`,
/// `DegenerateGeometry`, `ExcessiveRotation`) are isolated to the image that raised them.
/// `CacheCorruption` never escapes the cache layer as a fatal error; it is reported so callers
/// can log it and treat the lookup as a miss.
#[derive(thiserror::Error, Debug)]
pub enum FacelapseError {
    /// Invalid user-provided configuration or input set.
    #[error("validation error: {0}")]
    Validation(String),

    /// The landmark detector was unusable or the image could not be decoded.
    #[error("detection failure: {0}")]
    Detection(String),

    /// The detector returned zero faces.
    #[error("no face detected")]
    NoFaceDetected,

    /// More than one face and no selection rule bound to the image.
    #[error("{}", ambiguous_message(.candidates, .diagnostic))]
    AmbiguousFaceSelection {
        /// Number of detected candidates.
        candidates: usize,
        /// Diagnostic image with every candidate's bounding box drawn, if it could be written.
        diagnostic: Option<PathBuf>,
    },

    /// Eye centers coincide (or are otherwise unusable), so no finite transform exists.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The levelling rotation reaches the configured limit; only rotations strictly below it
    /// are applied.
    #[error("rotation of {degrees:.1} degrees is not below the limit of {limit:.1} degrees")]
    ExcessiveRotation {
        /// Absolute rotation needed to level the eyes.
        degrees: f64,
        /// Configured maximum.
        limit: f64,
    },

    /// A stored cache artifact was unreadable or malformed.
    #[error("cache corruption: {0}")]
    CacheCorruption(String),

    /// Warping, captioning, or encoding a frame failed.
    #[error("render error: {0}")]
    Render(String),

    /// The external video encoder failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn ambiguous_message(candidates: &usize, diagnostic: &Option<PathBuf>) -> String {
    match diagnostic {
        Some(path) => format!(
            "ambiguous face selection: found {candidates} faces; candidates are outlined in '{}', \
             add a 'face_selection_overrides' entry for this file to pick one",
            path.display()
        ),
        None => format!(
            "ambiguous face selection: found {candidates} faces; \
             add a 'face_selection_overrides' entry for this file to pick one"
        ),
    }
}

/// Stable, displayable error kind used in run reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`FacelapseError::Validation`].
    Validation,
    /// See [`FacelapseError::Detection`].
    DetectionFailure,
    /// See [`FacelapseError::NoFaceDetected`].
    NoFaceDetected,
    /// See [`FacelapseError::AmbiguousFaceSelection`].
    AmbiguousFaceSelection,
    /// See [`FacelapseError::DegenerateGeometry`].
    DegenerateGeometry,
    /// See [`FacelapseError::ExcessiveRotation`].
    ExcessiveRotation,
    /// See [`FacelapseError::CacheCorruption`].
    CacheCorruption,
    /// See [`FacelapseError::Render`].
    Render,
    /// See [`FacelapseError::Encode`].
    Encode,
    /// See [`FacelapseError::Other`].
    Other,
}

impl ErrorKind {
    /// Name used in reports and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::DetectionFailure => "DetectionFailure",
            Self::NoFaceDetected => "NoFaceDetected",
            Self::AmbiguousFaceSelection => "AmbiguousFaceSelection",
            Self::DegenerateGeometry => "DegenerateGeometry",
            Self::ExcessiveRotation => "ExcessiveRotation",
            Self::CacheCorruption => "CacheCorruption",
            Self::Render => "Render",
            Self::Encode => "Encode",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FacelapseError {
    /// Build a [`FacelapseError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FacelapseError::Detection`] value.
    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    /// Build a [`FacelapseError::DegenerateGeometry`] value.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    /// Build a [`FacelapseError::CacheCorruption`] value.
    pub fn cache_corruption(msg: impl Into<String>) -> Self {
        Self::CacheCorruption(msg.into())
    }

    /// Build a [`FacelapseError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FacelapseError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Detection(_) => ErrorKind::DetectionFailure,
            Self::NoFaceDetected => ErrorKind::NoFaceDetected,
            Self::AmbiguousFaceSelection { .. } => ErrorKind::AmbiguousFaceSelection,
            Self::DegenerateGeometry(_) => ErrorKind::DegenerateGeometry,
            Self::ExcessiveRotation { .. } => ErrorKind::ExcessiveRotation,
            Self::CacheCorruption(_) => ErrorKind::CacheCorruption,
            Self::Render(_) => ErrorKind::Render,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Path of the diagnostic artifact written alongside this error, if any.
    pub fn diagnostic_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::AmbiguousFaceSelection {
                diagnostic: Some(p),
                ..
            } => Some(p.as_path()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
