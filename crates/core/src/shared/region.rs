use std::fmt;
use std::marker::PhantomData;

/// Output-surface pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetSpace {}

/// Camera-frame pixels, as reported by a detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceSpace {}

/// Camera-relative fractions in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalizedSpace {}

/// Axis-aligned rectangle tagged with the coordinate space it lives in.
///
/// Rectangles from different spaces are distinct types; moving between
/// them goes through an explicit mapping such as [`NormalizedBox::to_source`].
#[derive(Clone, Copy, PartialEq)]
pub struct Rect<S> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    space: PhantomData<S>,
}

pub type TargetBox = Rect<TargetSpace>;
pub type SourceBox = Rect<SourceSpace>;
pub type NormalizedBox = Rect<NormalizedSpace>;

impl<S> Rect<S> {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    /// Builds a rectangle from its edges.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

impl NormalizedBox {
    /// Maps fractions of the frame to camera pixels.
    pub fn to_source(&self, frame_width: u32, frame_height: u32) -> SourceBox {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        SourceBox::new(self.x * fw, self.y * fh, self.width * fw, self.height * fh)
    }
}

impl<S> fmt::Debug for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rect")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<S> fmt::Display for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={:.1} y={:.1} w={:.1} h={:.1}",
            self.x, self.y, self.width, self.height
        )
    }
}
