use super::*;

use crate::{
    cache::fingerprint::SourceFingerprint, foundation::core::FrameRGBA, input::scan::ImageRef,
};

struct Sleepy(Duration);

impl FaceDetector for Sleepy {
    fn detect(&self, _req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>> {
        std::thread::sleep(self.0);
        Ok(Vec::new())
    }

    fn fingerprint_source(&self) -> String {
        "sleepy".to_string()
    }
}

fn request() -> DetectRequest {
    DetectRequest {
        image: ImageRef {
            path: "a.png".into(),
            file_name: "a.png".to_string(),
            fingerprint: SourceFingerprint("00".to_string()),
        },
        frame: Arc::new(FrameRGBA::new(1, 1, vec![0; 4], false).unwrap()),
    }
}

#[test]
fn fast_detector_passes_through() {
    let det = TimeoutDetector::new(Arc::new(Sleepy(Duration::ZERO)), Duration::from_secs(5));
    assert!(det.detect(&request()).unwrap().is_empty());
    assert_eq!(det.fingerprint_source(), "sleepy");
}

#[test]
fn slow_detector_fails_with_detection_error() {
    let det = TimeoutDetector::new(
        Arc::new(Sleepy(Duration::from_secs(2))),
        Duration::from_millis(50),
    );
    let err = det.detect(&request()).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::DetectionFailure);
    assert!(err.to_string().contains("timed out"));
}
