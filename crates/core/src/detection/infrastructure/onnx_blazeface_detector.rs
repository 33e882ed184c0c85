//! BlazeFace face detector using ONNX Runtime via `ort`.
//!
//! Serves as the native detection path: one synchronous inference per
//! frame, bounding boxes only.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectedFace, DetectorOptions, FaceDetector};
use crate::shared::frame::Frame;
use crate::shared::region::SourceBox;

use super::onnx_session::open_session;
use super::math::{nms, sigmoid, Scored};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box deltas plus six keypoints.
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    options: DetectorOptions,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    pub fn new(
        model_path: &Path,
        options: DetectorOptions,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;
        log::info!(
            "Loaded BlazeFace model from {} (fast_mode={}, max_faces={})",
            model_path.display(),
            options.fast_mode,
            options.max_detected_faces
        );
        Ok(Self {
            session,
            options,
            confidence: DEFAULT_CONFIDENCE,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let fw = frame.width() as f32;
        let fh = frame.height() as f32;

        let input_tensor = if self.options.fast_mode {
            preprocess_nearest(frame, INPUT_SIZE)
        } else {
            preprocess_area(frame, INPUT_SIZE)
        };

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut candidates = decode(
            &self.anchors,
            reg_data,
            score_data,
            self.confidence as f32,
            (fw, fh),
        );

        let mut kept = nms(&mut candidates, NMS_IOU_THRESH);
        kept.truncate(self.options.max_detected_faces);

        Ok(kept
            .iter()
            .map(|c| DetectedFace {
                bounding_box: SourceBox::from_edges(c.x1, c.y1, c.x2, c.y2),
                score: c.score,
            })
            .collect())
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    score: f64,
}

impl Scored for Candidate {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn score(&self) -> f64 {
        self.score
    }
}

/// Turns raw anchor outputs into frame-space boxes above `threshold`.
fn decode(
    anchors: &[[f32; 2]],
    reg_data: &[f32],
    score_data: &[f32],
    threshold: f32,
    (fw, fh): (f32, f32),
) -> Vec<Candidate> {
    let size = INPUT_SIZE as f32;
    let mut out = Vec::new();
    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score);
        if score < threshold {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        if offset + 4 > reg_data.len() {
            break;
        }

        let anchor = anchors[i];
        let cx = anchor[0] + reg_data[offset] / size;
        let cy = anchor[1] + reg_data[offset + 1] / size;
        let w = reg_data[offset + 2] / size;
        let h = reg_data[offset + 3] / size;

        let x1 = ((cx - w / 2.0) * fw).max(0.0);
        let y1 = ((cy - h / 2.0) * fh).max(0.0);
        let x2 = ((cx + w / 2.0) * fw).min(fw);
        let y2 = ((cy + h / 2.0) * fh).min(fh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        out.push(Candidate {
            x1: x1 as f64,
            y1: y1 as f64,
            x2: x2 as f64,
            y2: y2 as f64,
            score: score as f64,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Nearest-neighbour resize to `size × size`, normalized to [0,1] NCHW.
fn preprocess_nearest(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Area-averaging resize: each target pixel is the mean of the source
/// pixels it covers. Slower, less aliased on large frames.
fn preprocess_area(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let span = |i: usize, src_len: usize| {
        let start = i * src_len / s;
        let end = ((i + 1) * src_len / s).max(start + 1).min(src_len);
        (start.min(src_len - 1), end)
    };

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let (y0, y1) = span(y, src_h);
        for x in 0..s {
            let (x0, x1) = span(x, src_w);
            let count = ((y1 - y0) * (x1 - x0)) as f32;
            for c in 0..3 {
                let mut sum = 0.0f32;
                for sy in y0..y1 {
                    for sx in x0..x1 {
                        sum += src[[sy, sx, c]] as f32;
                    }
                }
                tensor[[0, c, y, x]] = sum / count / 255.0;
            }
        }
    }
    tensor
}

/// BlazeFace short-range anchors: a 16×16 grid with 2 anchors per cell and
/// an 8×8 grid with 6.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn logit(p: f32) -> f32 {
        (p / (1.0 - p)).ln()
    }

    #[rstest]
    #[case::nearest(true)]
    #[case::area(false)]
    fn test_preprocess_shape_and_range(#[case] fast: bool) {
        let frame = Frame::new(vec![255u8; 200 * 100 * 3], 200, 100, 3, 0);
        let tensor = if fast {
            preprocess_nearest(&frame, 128)
        } else {
            preprocess_area(&frame, 128)
        };
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
        assert!(tensor.iter().all(|v| (v - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_area_preprocess_averages_pixels() {
        // 2x1 frame: black then white; one target pixel covers both.
        let frame = Frame::new(vec![0, 0, 0, 255, 255, 255], 2, 1, 3, 0);
        let tensor = preprocess_area(&frame, 1);
        assert!((tensor[[0, 0, 0, 0]] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_area_preprocess_upsamples_small_frames() {
        let frame = Frame::new(vec![51u8; 4 * 4 * 3], 4, 4, 3, 0);
        let tensor = preprocess_area(&frame, 16);
        assert!((tensor[[0, 2, 15, 15]] - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_generate_anchors_count() {
        assert_eq!(generate_anchors().len(), NUM_ANCHORS);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in generate_anchors() {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_decode_maps_anchor_to_frame_pixels() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let mut reg = vec![0.0f32; 2 * REGRESSOR_STRIDE];
        // Anchor 0: centred box half the input wide and high.
        reg[2] = 64.0;
        reg[3] = 64.0;
        let scores = vec![logit(0.9), logit(0.1)];

        let c = decode(&anchors, &reg, &scores, 0.5, (640.0, 480.0));
        assert_eq!(c.len(), 1);
        assert!((c[0].x1 - 160.0).abs() < 1e-3);
        assert!((c[0].y1 - 120.0).abs() < 1e-3);
        assert!((c[0].x2 - 480.0).abs() < 1e-3);
        assert!((c[0].y2 - 360.0).abs() < 1e-3);
        assert!((c[0].score - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_decode_clamps_to_frame_and_drops_empty_boxes() {
        let anchors = vec![[0.0, 0.0], [0.5, 0.5]];
        let mut reg = vec![0.0f32; 2 * REGRESSOR_STRIDE];
        reg[2] = 64.0;
        reg[3] = 64.0;
        // Anchor 1 has zero size.
        let scores = vec![logit(0.8), logit(0.8)];

        let c = decode(&anchors, &reg, &scores, 0.5, (100.0, 100.0));
        assert_eq!(c.len(), 1);
        assert_eq!((c[0].x1, c[0].y1), (0.0, 0.0));
        assert!((c[0].x2 - 25.0).abs() < 1e-3);
    }
}
