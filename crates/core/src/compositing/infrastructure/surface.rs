use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, Mask, Paint, Path, Pattern, Pixmap, Rect, Shader,
    SpreadMode, Transform,
};

use crate::shared::region::{SourceBox, TargetBox};

use super::raster_image::{RasterError, RasterImage};

/// Clip and blend mode in effect for subsequent draws.
#[derive(Clone)]
struct GraphicsState {
    clip: Option<Mask>,
    blend_mode: BlendMode,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            clip: None,
            blend_mode: BlendMode::SourceOver,
        }
    }
}

/// Persistent output raster with a save/restore graphics-state stack.
///
/// Every draw honours the current clip and blend mode. `restore` pops
/// the most recent `save`; an unbalanced `restore` is ignored.
pub struct Surface {
    pixmap: Pixmap,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::ZeroSize { width, height })?;
        Ok(Self {
            pixmap,
            state: GraphicsState::default(),
            saved: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    /// Drops every saved state and returns to an unclipped source-over state.
    pub fn reset_state(&mut self) {
        self.saved.clear();
        self.state = GraphicsState::default();
    }

    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    pub fn has_clip(&self) -> bool {
        self.state.clip.is_some()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend_mode
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend_mode = mode;
    }

    /// Intersects the current clip with `path`.
    pub fn clip(&mut self, path: &Path) {
        match self.state.clip.as_mut() {
            Some(mask) => mask.intersect_path(path, FillRule::Winding, true, Transform::identity()),
            None => {
                if let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) {
                    mask.fill_path(path, FillRule::Winding, true, Transform::identity());
                    self.state.clip = Some(mask);
                }
            }
        }
    }

    /// Makes every pixel transparent. Ignores the clip.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    pub fn fill_path(&mut self, path: &Path, shader: Shader<'_>) {
        let paint = self.paint(shader);
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    pub fn fill_rect(&mut self, rect: &TargetBox, shader: Shader<'_>) {
        let Some(rect) = to_skia_rect(rect) else {
            return;
        };
        let paint = self.paint(shader);
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), self.state.clip.as_ref());
    }

    /// Draws the whole image stretched over the whole surface.
    pub fn draw_image_full(&mut self, image: &RasterImage) {
        let src = SourceBox::new(0.0, 0.0, image.width() as f64, image.height() as f64);
        let dst = TargetBox::new(0.0, 0.0, self.width() as f64, self.height() as f64);
        self.draw_image(image, &src, &dst);
    }

    /// Draws the `src` region of `image` stretched into `dst`.
    ///
    /// The source rectangle is first cut to the image bounds and `dst` is
    /// shrunk by the same proportion, so a source box that hangs off the
    /// frame edge never smears edge pixels.
    pub fn draw_image(&mut self, image: &RasterImage, src: &SourceBox, dst: &TargetBox) {
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let scale_x = dst.width / src.width;
        let scale_y = dst.height / src.height;

        let left = src.x.max(0.0);
        let top = src.y.max(0.0);
        let right = src.right().min(image.width() as f64);
        let bottom = src.bottom().min(image.height() as f64);
        if right <= left || bottom <= top {
            return;
        }
        let visible = TargetBox::from_edges(
            dst.x + (left - src.x) * scale_x,
            dst.y + (top - src.y) * scale_y,
            dst.x + (right - src.x) * scale_x,
            dst.y + (bottom - src.y) * scale_y,
        );
        let Some(rect) = to_skia_rect(&visible) else {
            return;
        };

        let transform = Transform::from_row(
            scale_x as f32,
            0.0,
            0.0,
            scale_y as f32,
            (dst.x - src.x * scale_x) as f32,
            (dst.y - src.y * scale_y) as f32,
        );
        let shader = Pattern::new(
            image.pixmap().as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            transform,
        );
        let paint = self.paint(shader);
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), self.state.clip.as_ref());
    }

    fn paint<'a>(&self, shader: Shader<'a>) -> Paint<'a> {
        let mut paint = Paint::default();
        paint.shader = shader;
        paint.blend_mode = self.state.blend_mode;
        paint.anti_alias = true;
        paint
    }
}

fn to_skia_rect(r: &TargetBox) -> Option<Rect> {
    Rect::from_xywh(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rounded_ellipse::rounded_ellipse;

    fn pixel(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
        let p = surface.pixmap().pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn solid(r: u8, g: u8, b: u8, w: u32, h: u32) -> RasterImage {
        let data: Vec<u8> = (0..w * h).flat_map(|_| [r, g, b]).collect();
        RasterImage::from_pixels(&data, w, h, 3).unwrap()
    }

    fn red() -> Shader<'static> {
        Shader::SolidColor(Color::from_rgba8(255, 0, 0, 255))
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Surface::new(0, 10).is_err());
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let s = Surface::new(4, 4).unwrap();
        assert_eq!(pixel(&s, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn test_save_restore_round_trips_state() {
        let mut s = Surface::new(20, 20).unwrap();
        let path = rounded_ellipse(0.0, 0.0, 10.0, 10.0, 0.0).to_path().unwrap();

        s.save();
        s.clip(&path);
        s.set_blend_mode(BlendMode::Multiply);
        assert!(s.has_clip());
        assert_eq!(s.save_depth(), 1);

        s.restore();
        assert!(!s.has_clip());
        assert_eq!(s.blend_mode(), BlendMode::SourceOver);
        assert_eq!(s.save_depth(), 0);
    }

    #[test]
    fn test_unbalanced_restore_is_ignored() {
        let mut s = Surface::new(4, 4).unwrap();
        s.set_blend_mode(BlendMode::Multiply);
        s.restore();
        assert_eq!(s.blend_mode(), BlendMode::Multiply);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut s = Surface::new(100, 100).unwrap();
        let path = rounded_ellipse(0.0, 0.0, 100.0, 100.0, 0.0).to_path().unwrap();
        s.clip(&path);
        s.fill_rect(&TargetBox::new(0.0, 0.0, 100.0, 100.0), red());

        assert_eq!(pixel(&s, 50, 50), [255, 0, 0, 255]);
        // Corner lies outside the inscribed ellipse.
        assert_eq!(pixel(&s, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_nested_clips_intersect() {
        let mut s = Surface::new(100, 100).unwrap();
        let left = rounded_ellipse(0.0, 0.0, 60.0, 100.0, 0.0).to_path().unwrap();
        let right = rounded_ellipse(40.0, 0.0, 60.0, 100.0, 0.0).to_path().unwrap();
        s.clip(&left);
        s.clip(&right);
        s.fill_rect(&TargetBox::new(0.0, 0.0, 100.0, 100.0), red());

        assert_eq!(pixel(&s, 50, 50), [255, 0, 0, 255]);
        assert_eq!(pixel(&s, 15, 50), [0, 0, 0, 0]);
        assert_eq!(pixel(&s, 85, 50), [0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_image_full_stretches() {
        let mut s = Surface::new(10, 10).unwrap();
        s.draw_image_full(&solid(0, 0, 255, 2, 2));
        assert_eq!(pixel(&s, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&s, 9, 9), [0, 0, 255, 255]);
    }

    #[test]
    fn test_draw_image_maps_source_region_into_target() {
        // Left half green, right half blue.
        let mut data = Vec::new();
        for _y in 0..10 {
            for x in 0..20 {
                data.extend_from_slice(if x < 10 { &[0, 255, 0] } else { &[0, 0, 255] });
            }
        }
        let image = RasterImage::from_pixels(&data, 20, 10, 3).unwrap();
        let mut s = Surface::new(40, 40).unwrap();

        // Only the blue half, stretched into a 20x20 box at (10, 10).
        s.draw_image(
            &image,
            &SourceBox::new(10.0, 0.0, 10.0, 10.0),
            &TargetBox::new(10.0, 10.0, 20.0, 20.0),
        );

        assert_eq!(pixel(&s, 20, 20), [0, 0, 255, 255]);
        assert_eq!(pixel(&s, 11, 11), [0, 0, 255, 255]);
        assert_eq!(pixel(&s, 5, 5), [0, 0, 0, 0]);
        assert_eq!(pixel(&s, 35, 35), [0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_image_cuts_source_to_image_bounds() {
        let image = solid(255, 255, 255, 10, 10);
        let mut s = Surface::new(40, 40).unwrap();

        // Source hangs 10px off the right edge: only the left half of dst is drawn.
        s.draw_image(
            &image,
            &SourceBox::new(0.0, 0.0, 20.0, 10.0),
            &TargetBox::new(0.0, 0.0, 40.0, 20.0),
        );

        assert_eq!(pixel(&s, 10, 10), [255, 255, 255, 255]);
        assert_eq!(pixel(&s, 30, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_image_outside_frame_draws_nothing() {
        let image = solid(255, 255, 255, 10, 10);
        let mut s = Surface::new(20, 20).unwrap();
        s.draw_image(
            &image,
            &SourceBox::new(50.0, 50.0, 10.0, 10.0),
            &TargetBox::new(0.0, 0.0, 20.0, 20.0),
        );
        assert!(s.pixmap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_multiply_darkens_existing_pixels() {
        let mut s = Surface::new(4, 4).unwrap();
        s.draw_image_full(&solid(200, 200, 200, 1, 1));
        s.set_blend_mode(BlendMode::Multiply);
        s.fill_rect(
            &TargetBox::new(0.0, 0.0, 4.0, 4.0),
            Shader::SolidColor(Color::from_rgba8(128, 128, 128, 255)),
        );
        let [r, _, _, a] = pixel(&s, 2, 2);
        assert!(r < 200 && r > 90, "got {r}");
        assert_eq!(a, 255);
    }

    #[test]
    fn test_clear_resets_pixels() {
        let mut s = Surface::new(4, 4).unwrap();
        s.fill_rect(&TargetBox::new(0.0, 0.0, 4.0, 4.0), red());
        s.clear();
        assert_eq!(pixel(&s, 1, 1), [0, 0, 0, 0]);
    }
}
