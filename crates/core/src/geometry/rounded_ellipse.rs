//! Closed elliptical outline built from four cubic Bézier quadrants.
//!
//! Used both as the fill shape of the darkened cutout and as the clip
//! region the face is drawn through.

/// Circle-to-Bézier control point factor, `4/3 * (sqrt(2) - 1)`.
pub const KAPPA: f64 = 0.552_284_8;

/// Corner radius used by every call site, relative to the box's smaller side.
pub const CORNER_RADIUS_FRACTION: f64 = 0.18;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl PathPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One cubic segment: two control points and an end point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicSegment {
    pub ctrl1: PathPoint,
    pub ctrl2: PathPoint,
    pub end: PathPoint,
}

/// Ellipse outline starting at the left midpoint and running through the
/// top, right and bottom midpoints back to the start.
#[derive(Clone, Debug, PartialEq)]
pub struct EllipsePath {
    start: PathPoint,
    segments: [CubicSegment; 4],
    corner_radius: f64,
}

/// Builds the ellipse inscribed in the rectangle `(x, y, w, h)`.
///
/// `corner_radius` is carried on the path for callers that want it; the
/// kappa construction already yields a smooth outline, so it does not move
/// any control point.
pub fn rounded_ellipse(x: f64, y: f64, w: f64, h: f64, corner_radius: f64) -> EllipsePath {
    let ox = (w / 2.0) * KAPPA;
    let oy = (h / 2.0) * KAPPA;
    let xe = x + w;
    let ye = y + h;
    let xm = x + w / 2.0;
    let ym = y + h / 2.0;

    let p = PathPoint::new;
    let seg = |c1: PathPoint, c2: PathPoint, end: PathPoint| CubicSegment {
        ctrl1: c1,
        ctrl2: c2,
        end,
    };

    EllipsePath {
        start: p(x, ym),
        segments: [
            seg(p(x, ym - oy), p(xm - ox, y), p(xm, y)),
            seg(p(xm + ox, y), p(xe, ym - oy), p(xe, ym)),
            seg(p(xe, ym + oy), p(xm + ox, ye), p(xm, ye)),
            seg(p(xm - ox, ye), p(x, ym + oy), p(x, ym)),
        ],
        corner_radius,
    }
}

impl EllipsePath {
    pub fn start(&self) -> PathPoint {
        self.start
    }

    pub fn end(&self) -> PathPoint {
        self.segments[3].end
    }

    pub fn segments(&self) -> &[CubicSegment; 4] {
        &self.segments
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn is_closed(&self) -> bool {
        self.start == self.end()
    }

    /// Converts to a rasterizable path. `None` when the outline encloses
    /// no area (zero or negative size, non-finite coordinates).
    pub fn to_path(&self) -> Option<tiny_skia::Path> {
        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(self.start.x as f32, self.start.y as f32);
        for s in &self.segments {
            pb.cubic_to(
                s.ctrl1.x as f32,
                s.ctrl1.y as f32,
                s.ctrl2.x as f32,
                s.ctrl2.y as f32,
                s.end.x as f32,
                s.end.y as f32,
            );
        }
        pb.close();
        let path = pb.finish()?;
        let bounds = path.bounds();
        (bounds.width() > 0.0 && bounds.height() > 0.0).then_some(path)
    }
}
