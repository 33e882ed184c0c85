use crate::compositing::infrastructure::raster_image::RasterImage;
use crate::compositing::infrastructure::surface::Surface;
use crate::shared::region::{SourceBox, TargetBox};

/// Domain interface for drawing one tick of the cutout scene.
///
/// Implementations draw onto a caller-owned surface and must leave its
/// graphics state (clip and blend mode) as they found it.
pub trait SceneCompositor: Send {
    /// Redraws the background and the darkened cutout from scratch.
    fn draw_base(&self, surface: &mut Surface, background: &RasterImage, target: &TargetBox);

    /// Draws the `source` region of the live frame into the cutout.
    fn draw_face_into_box(
        &self,
        surface: &mut Surface,
        live_frame: &RasterImage,
        target: &TargetBox,
        source: &SourceBox,
        feather: f64,
    );
}
