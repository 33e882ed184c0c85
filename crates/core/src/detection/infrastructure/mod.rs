pub mod locator_factory;
pub mod math;
pub mod native_face_locator;
pub mod onnx_blazeface_detector;
pub mod onnx_landmark_tracker;
pub mod onnx_session;
pub mod streaming_tracker_locator;
pub mod tracker_loader;
