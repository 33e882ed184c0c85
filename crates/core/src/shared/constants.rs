pub const LANDMARK_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
/// Default location the landmark model is fetched from; overridable per session.
pub const DEFAULT_ASSET_BASE_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0";

/// Fixed bound on how long the streaming tracker may take to load.
pub const TRACKER_LOAD_TIMEOUT_SECS: u64 = 10;

/// Normalized padding added on every side of a landmark bounding rectangle.
pub const LANDMARK_PADDING: f64 = 0.05;

/// Display refresh rate the render loop paces itself to.
pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;

pub const SNAPSHOT_FILENAME: &str = "cutout-photo.png";
pub const SNAPSHOT_LABEL: &str = "Download Photo";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
