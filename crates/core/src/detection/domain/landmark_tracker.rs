use std::error::Error;
use std::sync::Arc;

use crate::shared::frame::Frame;

/// A landmark position as a fraction of the frame it was computed on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// All landmarks tracked for one face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<NormalizedPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<NormalizedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerOptions {
    pub max_num_faces: usize,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f64,
    pub min_tracking_confidence: f64,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            max_num_faces: 1,
            refine_landmarks: false,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

pub type TrackerError = Box<dyn Error + Send + Sync>;

/// Landmark-mesh collaborator. Runs off the render thread.
pub trait LandmarkTracker: Send {
    /// Returns one landmark set per tracked face; empty when none is visible.
    fn process(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, TrackerError>;
}

/// Maps an asset file name to the location it should be fetched from.
pub type AssetLocator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Builds a ready-to-use tracker, fetching whatever assets it needs.
pub trait TrackerLoader: Send + Sync {
    fn load(
        &self,
        options: &TrackerOptions,
        locate_asset: &AssetLocator,
    ) -> Result<Box<dyn LandmarkTracker>, TrackerError>;
}
