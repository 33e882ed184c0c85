use crate::shared::frame::Frame;
use crate::shared::region::SourceBox;

/// One face reported by a detector, in camera pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectedFace {
    pub bounding_box: SourceBox,
    pub score: f64,
}

/// Construction hints for a native detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorOptions {
    /// Trade accuracy for latency where the backend supports it.
    pub fast_mode: bool,
    pub max_detected_faces: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            fast_mode: true,
            max_detected_faces: 1,
        }
    }
}

/// Domain interface for synchronous face detection.
///
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
