//! Box arithmetic shared by the ONNX backends.

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// A scored candidate box awaiting suppression.
pub trait Scored {
    fn bbox(&self) -> [f64; 4];
    fn score(&self) -> f64;
}

/// Greedy NMS: sort by score descending, drop boxes overlapping a kept one
/// by more than `iou_thresh`.
pub fn nms<T: Scored + Clone>(dets: &mut [T], iou_thresh: f64) -> Vec<T> {
    dets.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<T> = Vec::new();
    for det in dets.iter() {
        let bbox = det.bbox();
        if keep.iter().all(|k| bbox_iou(&k.bbox(), &bbox) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Det([f64; 4], f64);

    impl Scored for Det {
        fn bbox(&self) -> [f64; 4] {
            self.0
        }
        fn score(&self) -> f64 {
            self.1
        }
    }

    #[test]
    fn test_bbox_iou_no_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [20.0, 20.0, 30.0, 30.0];
        assert_eq!(bbox_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_bbox_iou_perfect_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((bbox_iou(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 5.0, 15.0, 15.0];
        let expected = 25.0 / 175.0;
        assert!((bbox_iou(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            Det([0.0, 0.0, 100.0, 100.0], 0.9),
            Det([5.0, 5.0, 105.0, 105.0], 0.7),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].1 - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_separate() {
        let mut dets = vec![
            Det([0.0, 0.0, 50.0, 50.0], 0.9),
            Det([200.0, 200.0, 250.0, 250.0], 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_higher_score_wins() {
        let mut dets = vec![
            Det([0.0, 0.0, 100.0, 100.0], 0.5),
            Det([2.0, 2.0, 102.0, 102.0], 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].1 - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut dets: Vec<Det> = Vec::new();
        assert!(nms(&mut dets, 0.3).is_empty());
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
        assert!(sigmoid(-10.0) < 0.001);
    }
}
