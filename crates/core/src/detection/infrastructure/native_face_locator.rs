use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_locator::{DetectionError, FaceLocator, LocatorKind};
use crate::detection::domain::face_selection::largest_face;
use crate::shared::frame::Frame;
use crate::shared::region::SourceBox;

/// Polls a synchronous detector once per tick and keeps the largest face.
pub struct NativeFaceLocator {
    detector: Box<dyn FaceDetector>,
}

impl NativeFaceLocator {
    pub fn new(detector: Box<dyn FaceDetector>) -> Self {
        Self { detector }
    }
}

impl FaceLocator for NativeFaceLocator {
    fn poll_latest_box(&mut self, frame: &Frame) -> Result<Option<SourceBox>, DetectionError> {
        if !frame.has_data() {
            return Ok(None);
        }
        let faces = self
            .detector
            .detect(frame)
            .map_err(|e| DetectionError::Detector(e.to_string()))?;
        Ok(largest_face(&faces).map(|f| f.bounding_box))
    }

    fn kind(&self) -> LocatorKind {
        LocatorKind::Native
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::DetectedFace;

    struct StubDetector {
        faces: Vec<DetectedFace>,
        fail: bool,
        calls: usize,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            self.calls += 1;
            if self.fail {
                return Err("inference blew up".into());
            }
            Ok(self.faces.clone())
        }
    }

    fn locator(faces: Vec<DetectedFace>, fail: bool) -> NativeFaceLocator {
        NativeFaceLocator::new(Box::new(StubDetector {
            faces,
            fail,
            calls: 0,
        }))
    }

    fn face(x: f64, size: f64) -> DetectedFace {
        DetectedFace {
            bounding_box: SourceBox::new(x, 10.0, size, size),
            score: 0.8,
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 8 * 6 * 3], 8, 6, 3, 0)
    }

    #[test]
    fn test_returns_largest_face() {
        let mut l = locator(vec![face(1.0, 10.0), face(2.0, 30.0)], false);
        let b = l.poll_latest_box(&frame()).unwrap().unwrap();
        assert_eq!(b, SourceBox::new(2.0, 10.0, 30.0, 30.0));
    }

    #[test]
    fn test_no_faces_is_absent() {
        let mut l = locator(vec![], false);
        assert_eq!(l.poll_latest_box(&frame()).unwrap(), None);
    }

    #[test]
    fn test_failure_is_reported_for_that_poll_only() {
        let mut l = locator(vec![face(0.0, 5.0)], true);
        let err = l.poll_latest_box(&frame()).unwrap_err();
        assert!(matches!(err, DetectionError::Detector(ref m) if m.contains("blew up")));
    }

    #[test]
    fn test_frame_without_data_skips_detector() {
        let mut l = locator(vec![face(0.0, 5.0)], true);
        let empty = Frame::new(vec![], 0, 0, 3, 0);
        assert_eq!(l.poll_latest_box(&empty).unwrap(), None);
    }

    #[test]
    fn test_kind() {
        assert_eq!(locator(vec![], false).kind(), LocatorKind::Native);
    }
}
