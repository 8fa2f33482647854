use std::{sync::Arc, time::Duration};

use crate::{
    detect::{DetectRequest, FaceCandidate, FaceDetector},
    foundation::error::{FacelapseError, FacelapseResult},
};

/// Bounds the wall-clock time of an in-process detector.
///
/// The inner call runs on a helper thread. When it overruns, the image fails with a detection
/// error and the helper is left to finish in the background; its result is discarded.
pub struct TimeoutDetector {
    inner: Arc<dyn FaceDetector>,
    timeout: Duration,
}

impl TimeoutDetector {
    pub fn new(inner: Arc<dyn FaceDetector>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl FaceDetector for TimeoutDetector {
    fn detect(&self, req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>> {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);
        let owned = req.clone();
        std::thread::Builder::new()
            .name("facelapse-detect".to_string())
            .spawn(move || {
                let _ = tx.send(inner.detect(&owned));
            })
            .map_err(|e| FacelapseError::detection(format!("spawn detector thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(res) => res,
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(file = %req.image.file_name, "detector timed out");
                Err(FacelapseError::detection(format!(
                    "detector timed out after {} ms on '{}'",
                    self.timeout.as_millis(),
                    req.image.file_name
                )))
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => Err(
                FacelapseError::detection("detector thread panicked"),
            ),
        }
    }

    fn fingerprint_source(&self) -> String {
        self.inner.fingerprint_source()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/detect/timeout.rs"]
mod tests;
