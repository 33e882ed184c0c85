use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera access denied: {0}")]
    Denied(String),
    #[error("failed to read camera frame: {0}")]
    Read(String),
}

/// Live video source for the session.
pub trait Camera: Send {
    /// Acquires the device. Failure means the user or platform refused access.
    fn open(&mut self) -> Result<(), CameraError>;

    /// Latest frame, or `None` when nothing new is available yet.
    fn grab(&mut self) -> Result<Option<Frame>, CameraError>;

    /// Whether the source has ended and will never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }
}
