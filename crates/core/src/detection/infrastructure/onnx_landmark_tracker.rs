//! YOLO-pose face landmark tracker using ONNX Runtime via `ort`.
//!
//! Each tracked face yields its detection box corners plus whichever of
//! the five facial keypoints are visible, as fractions of the frame.
use std::path::{Path, PathBuf};

use crate::detection::domain::landmark_tracker::{
    AssetLocator, LandmarkSet, LandmarkTracker, NormalizedPoint, TrackerError, TrackerLoader,
    TrackerOptions,
};
use crate::shared::constants::LANDMARK_MODEL_NAME;
use crate::shared::frame::Frame;
use crate::shared::model_resolver;

use super::onnx_session::open_session;
use super::math::{nms, Scored};

/// Fallback input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESH: f64 = 0.45;

/// 5 keypoints × (x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

pub struct OnnxLandmarkTracker {
    session: ort::session::Session,
    options: TrackerOptions,
    input_size: u32,
}

impl OnnxLandmarkTracker {
    /// Loads a YOLO-pose ONNX model.
    ///
    /// The input resolution is read from the model's NCHW input shape,
    /// falling back to 640 when it is dynamic or unreadable.
    pub fn new(model_path: &Path, options: TrackerOptions) -> Result<Self, TrackerError> {
        let session = open_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        if options.refine_landmarks {
            log::warn!("Refined landmarks are not available; using the five-point model");
        }

        Ok(Self {
            session,
            options,
            input_size,
        })
    }
}

impl LandmarkTracker for OnnxLandmarkTracker {
    fn process(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, TrackerError> {
        let (input_tensor, lb) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("landmark model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected landmark output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let rows = OutputRows::new(data, shape[1], shape[2]);
        let mut candidates = parse_rows(&rows, &self.options, &lb);
        let mut kept = nms(&mut candidates, NMS_IOU_THRESH);
        kept.truncate(self.options.max_num_faces);

        Ok(kept
            .iter()
            .map(|c| c.to_landmarks(frame.width() as f64, frame.height() as f64))
            .collect())
    }
}

/// Resolves the landmark model through the asset locator and model cache.
pub struct OnnxTrackerLoader {
    bundled_dir: Option<PathBuf>,
}

impl OnnxTrackerLoader {
    pub fn new(bundled_dir: Option<PathBuf>) -> Self {
        Self { bundled_dir }
    }
}

impl TrackerLoader for OnnxTrackerLoader {
    fn load(
        &self,
        options: &TrackerOptions,
        locate_asset: &AssetLocator,
    ) -> Result<Box<dyn LandmarkTracker>, TrackerError> {
        let url = locate_asset(LANDMARK_MODEL_NAME);
        let path = model_resolver::resolve(LANDMARK_MODEL_NAME, &url, self.bundled_dir.as_deref())?;
        log::info!("Loading landmark model from {}", path.display());
        Ok(Box::new(OnnxLandmarkTracker::new(&path, *options)?))
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// Row view over a `[1, a, b]` output that may be stored either
/// `[detections, features]` or transposed `[features, detections]`.
struct OutputRows<'a> {
    data: &'a [f32],
    num_dets: usize,
    num_feats: usize,
    transposed: bool,
}

impl<'a> OutputRows<'a> {
    fn new(data: &'a [f32], dim1: usize, dim2: usize) -> Self {
        let transposed = dim1 < dim2;
        let (num_dets, num_feats) = if transposed { (dim2, dim1) } else { (dim1, dim2) };
        Self {
            data,
            num_dets,
            num_feats,
            transposed,
        }
    }

    fn row(&self, i: usize) -> Vec<f32> {
        if self.transposed {
            (0..self.num_feats)
                .map(|f| self.data[f * self.num_dets + i])
                .collect()
        } else {
            self.data[i * self.num_feats..(i + 1) * self.num_feats].to_vec()
        }
    }
}

/// Letterbox geometry used to map model coordinates back to the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl Letterbox {
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Vec<(f64, f64)>,
}

impl Scored for Candidate {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn score(&self) -> f64 {
        self.confidence
    }
}

impl Candidate {
    fn to_landmarks(&self, fw: f64, fh: f64) -> LandmarkSet {
        let corners = [(self.x1, self.y1), (self.x2, self.y2)];
        LandmarkSet::new(
            corners
                .iter()
                .chain(self.keypoints.iter())
                .map(|&(x, y)| NormalizedPoint::new(x / fw, y / fh))
                .collect(),
        )
    }
}

/// Row layout: `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_rows(rows: &OutputRows, options: &TrackerOptions, lb: &Letterbox) -> Vec<Candidate> {
    let mut out = Vec::new();
    for i in 0..rows.num_dets {
        let row = rows.row(i);
        if row.len() < 5 {
            continue;
        }
        let confidence = row[4] as f64;
        if confidence < options.min_detection_confidence {
            continue;
        }

        let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
        let (x1, y1) = lb.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = lb.unmap(cx + w / 2.0, cy + h / 2.0);

        let mut keypoints = Vec::new();
        if row.len() >= 5 + NUM_KEYPOINT_VALUES {
            for k in row[5..5 + NUM_KEYPOINT_VALUES].chunks_exact(3) {
                if k[2] as f64 >= options.min_tracking_confidence {
                    keypoints.push(lb.unmap(k[0] as f64, k[1] as f64));
                }
            }
        }

        out.push(Candidate {
            x1,
            y1,
            x2,
            y2,
            confidence,
            keypoints,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`, padding with
/// YOLO's 114 gray.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}
