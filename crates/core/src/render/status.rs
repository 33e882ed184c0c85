use std::fmt;

/// What the session is doing, as shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    AwaitingPermission,
    PermissionDenied,
    Searching,
    FaceDetected,
    DetectorUnsupported,
    DetectionError,
    TrackerLoadFailed,
}

impl SessionStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AwaitingPermission => "Starting camera...",
            Self::PermissionDenied => "Camera permission needed. Please allow access.",
            Self::Searching => "Place your face in front of the camera.",
            Self::FaceDetected => "Face detected!",
            Self::DetectorUnsupported => {
                "Face detection not supported. Provide a detector model or enable the landmark tracker."
            }
            Self::DetectionError => "Face detection error.",
            Self::TrackerLoadFailed => "Landmark tracker failed to load. Restart to try again.",
        }
    }

    /// No further detection happens in this session once reached.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::DetectorUnsupported | Self::TrackerLoadFailed
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Current status plus an optional detail line (last error or last box).
#[derive(Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub status: SessionStatus,
    pub diagnostic: Option<String>,
}

impl StatusReport {
    pub fn new(status: SessionStatus) -> Self {
        Self {
            status,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(status: SessionStatus, diagnostic: impl Into<String>) -> Self {
        Self {
            status,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.diagnostic {
            Some(d) => write!(f, "{} ({d})", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}
