use crate::shared::region::NormalizedBox;

use super::landmark_tracker::LandmarkSet;

/// Bounding rectangle over every point of `set`, grown by `padding` on each
/// side and clamped to the unit square. `None` for an empty set.
pub fn landmark_bounds(set: &LandmarkSet, padding: f64) -> Option<NormalizedBox> {
    let first = set.points().first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x, first.y);
    for p in &set.points()[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let left = (min_x - padding).clamp(0.0, 1.0);
    let top = (min_y - padding).clamp(0.0, 1.0);
    let right = (max_x + padding).clamp(0.0, 1.0);
    let bottom = (max_y + padding).clamp(0.0, 1.0);
    Some(NormalizedBox::from_edges(left, top, right, bottom))
}
