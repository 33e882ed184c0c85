use super::face_detector::DetectedFace;

/// Picks the face with the largest bounding-box area.
///
/// Among equal maxima the first one encountered wins.
pub fn largest_face(faces: &[DetectedFace]) -> Option<&DetectedFace> {
    let mut best: Option<&DetectedFace> = None;
    for face in faces {
        match best {
            Some(b) if face.bounding_box.area() <= b.bounding_box.area() => {}
            _ => best = Some(face),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::SourceBox;

    fn face(x: f64, w: f64, h: f64) -> DetectedFace {
        DetectedFace {
            bounding_box: SourceBox::new(x, 0.0, w, h),
            score: 0.9,
        }
    }

    #[test]
    fn test_empty_gives_none() {
        assert!(largest_face(&[]).is_none());
    }

    #[test]
    fn test_picks_largest_area() {
        let faces = [face(0.0, 10.0, 10.0), face(1.0, 30.0, 20.0), face(2.0, 20.0, 20.0)];
        assert_eq!(largest_face(&faces).unwrap().bounding_box.x, 1.0);
    }

    #[test]
    fn test_equal_areas_keep_first() {
        let faces = [face(0.0, 10.0, 40.0), face(1.0, 20.0, 20.0), face(2.0, 40.0, 10.0)];
        assert_eq!(largest_face(&faces).unwrap().bounding_box.x, 0.0);
    }

    #[test]
    fn test_area_beats_score() {
        let mut small = face(0.0, 5.0, 5.0);
        small.score = 0.99;
        let mut large = face(1.0, 50.0, 50.0);
        large.score = 0.51;
        assert_eq!(largest_face(&[small, large]).unwrap().bounding_box.x, 1.0);
    }
}
