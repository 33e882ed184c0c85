use std::path::Path;

use thiserror::Error;

use crate::detection::domain::face_detector::{DetectorOptions, FaceDetector};
use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::landmark_tracker::LandmarkTracker;

use super::native_face_locator::NativeFaceLocator;
use super::onnx_blazeface_detector::OnnxBlazefaceDetector;
use super::streaming_tracker_locator::StreamingTrackerLocator;
use super::tracker_loader::{PendingTracker, TrackerSource};

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("no face detector is available on this system")]
    Unsupported,
}

/// Outcome of locator selection: native detection is usable at once, the
/// tracker only after its background load completes.
pub enum LocatorSelection {
    Ready(Box<dyn FaceLocator>),
    Loading(PendingTracker),
}

/// Builds the native detector from a BlazeFace model, if one is given and
/// loads. `None` means the native path is unavailable.
pub fn open_native_detector(model_path: Option<&Path>) -> Option<Box<dyn FaceDetector>> {
    let path = model_path?;
    match OnnxBlazefaceDetector::new(path, DetectorOptions::default()) {
        Ok(detector) => Some(Box::new(detector)),
        Err(e) => {
            log::warn!("Native face detector unavailable ({}): {e}", path.display());
            None
        }
    }
}

/// Picks the detection path for a session.
///
/// The native detector wins unless the tracker is explicitly preferred.
/// The tracker is used when native detection is absent or preferred; its
/// load is started here and must finish within its source's timeout.
pub fn select_locator(
    native: Option<Box<dyn FaceDetector>>,
    tracker: Option<&TrackerSource>,
    prefer_tracker: bool,
) -> Result<LocatorSelection, LocatorError> {
    if let Some(source) = tracker.filter(|_| prefer_tracker || native.is_none()) {
        log::info!("Loading landmark tracker");
        return Ok(LocatorSelection::Loading(source.begin_load()));
    }
    match native {
        Some(detector) => {
            if prefer_tracker {
                log::warn!("Landmark tracker requested but unavailable; using native detector");
            }
            log::info!("Using native face detector");
            Ok(LocatorSelection::Ready(Box::new(NativeFaceLocator::new(
                detector,
            ))))
        }
        None => Err(LocatorError::Unsupported),
    }
}

/// Wraps a loaded tracker in a streaming locator.
pub fn tracker_locator(tracker: Box<dyn LandmarkTracker>) -> Box<dyn FaceLocator> {
    Box::new(StreamingTrackerLocator::new(tracker))
}
