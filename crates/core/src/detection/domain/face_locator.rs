use std::fmt;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::SourceBox;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("face detector failed: {0}")]
    Detector(String),
    #[error("landmark tracker failed: {0}")]
    Tracker(String),
    #[error("landmark tracker stopped unexpectedly")]
    TrackerStopped,
}

/// Which detection path a locator runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocatorKind {
    Native,
    Tracker,
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native detector"),
            Self::Tracker => f.write_str("landmark tracker"),
        }
    }
}

/// Answers "where is the face in this frame?" once per tick.
///
/// Errors are per poll: the caller treats the box as absent for that tick
/// and polls again on the next one.
pub trait FaceLocator: Send {
    fn poll_latest_box(&mut self, frame: &Frame) -> Result<Option<SourceBox>, DetectionError>;

    fn kind(&self) -> LocatorKind;
}
