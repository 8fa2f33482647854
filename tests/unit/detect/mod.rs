use super::*;
use crate::cache::fingerprint::SourceFingerprint;

fn candidate(lx: f64, rx: f64) -> FaceCandidate {
    FaceCandidate {
        bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        left_eye: Point::new(lx, 5.0),
        right_eye: Point::new(rx, 7.0),
    }
}

struct Fixed(Vec<FaceCandidate>);

impl FaceDetector for Fixed {
    fn detect(&self, _req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>> {
        Ok(self.0.clone())
    }

    fn fingerprint_source(&self) -> String {
        "fixed".to_string()
    }
}

fn request() -> DetectRequest {
    DetectRequest {
        image: ImageRef {
            path: "1.jpg".into(),
            file_name: "1.jpg".to_string(),
            fingerprint: SourceFingerprint("00".to_string()),
        },
        frame: Arc::new(FrameRGBA::new(1, 1, vec![0, 0, 0, 255], false).unwrap()),
    }
}

#[test]
fn normalized_orders_eyes_by_x() {
    let swapped = candidate(8.0, 2.0).normalized();
    assert_eq!(swapped.left_eye, Point::new(2.0, 7.0));
    assert_eq!(swapped.right_eye, Point::new(8.0, 5.0));
    assert_eq!(candidate(2.0, 8.0).normalized(), candidate(2.0, 8.0));
}

#[test]
fn eye_geometry_helpers() {
    let c = candidate(2.0, 8.0);
    assert_eq!(c.eye_vector(), Vec2::new(6.0, 2.0));
    assert_eq!(c.eye_midpoint(), Point::new(5.0, 6.0));
}

#[test]
fn detect_faces_normalizes_and_keeps_order() {
    let det = Fixed(vec![candidate(9.0, 1.0), candidate(3.0, 4.0)]);
    let faces = detect_faces(&det, &request()).unwrap();
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[0].left_eye.x, 1.0);
    assert_eq!(faces[1].left_eye.x, 3.0);
}
