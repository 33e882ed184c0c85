use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::compositing::domain::scene_compositor::SceneCompositor;
use crate::compositing::infrastructure::raster_image::{RasterError, RasterImage};
use crate::compositing::infrastructure::surface::Surface;
use crate::geometry::target_box::target_box;
use crate::shared::config::CutoutConfig;
use crate::shared::region::{SourceBox, TargetBox};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to load background {path}: {source}")]
    Background {
        path: PathBuf,
        #[source]
        source: RasterError,
    },
    #[error("failed to allocate output surface: {0}")]
    Surface(#[source] RasterError),
}

/// Everything one compositing session draws with: placement, background
/// and the output surface sized to the background's native resolution.
pub struct Session {
    config: CutoutConfig,
    background: RasterImage,
    surface: Surface,
    target: TargetBox,
}

impl Session {
    pub fn new(config: CutoutConfig, background: RasterImage) -> Result<Self, SessionError> {
        let surface =
            Surface::new(background.width(), background.height()).map_err(SessionError::Surface)?;
        let target = target_box(&config, surface.width(), surface.height());
        log::info!(
            "Session {}x{}, cutout at {target}",
            surface.width(),
            surface.height()
        );
        Ok(Self {
            config,
            background,
            surface,
            target,
        })
    }

    /// Loads the background image from disk. Failure is fatal for the session.
    pub fn load(config: CutoutConfig, background_path: &Path) -> Result<Self, SessionError> {
        let background =
            RasterImage::open(background_path).map_err(|source| SessionError::Background {
                path: background_path.to_path_buf(),
                source,
            })?;
        Self::new(config, background)
    }

    pub fn config(&self) -> &CutoutConfig {
        &self.config
    }

    pub fn background(&self) -> &RasterImage {
        &self.background
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn target(&self) -> &TargetBox {
        &self.target
    }

    pub fn draw_base(&mut self, compositor: &dyn SceneCompositor) {
        compositor.draw_base(&mut self.surface, &self.background, &self.target);
    }

    pub fn draw_face(
        &mut self,
        compositor: &dyn SceneCompositor,
        live_frame: &RasterImage,
        source: &SourceBox,
    ) {
        compositor.draw_face_into_box(
            &mut self.surface,
            live_frame,
            &self.target,
            source,
            self.config.feather,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn background(w: u32, h: u32) -> RasterImage {
        RasterImage::from_pixels(&vec![128; (w * h * 3) as usize], w, h, 3).unwrap()
    }

    #[test]
    fn test_surface_matches_background_resolution() {
        let s = Session::new(CutoutConfig::default(), background(1000, 1000)).unwrap();
        assert_eq!((s.surface().width(), s.surface().height()), (1000, 1000));
        assert_relative_eq!(s.target().x, 720.0, epsilon = 1e-9);
        assert_relative_eq!(s.target().y, 240.0, epsilon = 1e-9);
        assert_relative_eq!(s.target().width, 230.0, epsilon = 1e-9);
        assert_relative_eq!(s.target().height, 230.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_background_is_fatal() {
        let err = Session::load(CutoutConfig::default(), Path::new("/nonexistent/bg.png"))
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::Background { .. }));
        assert!(err.to_string().contains("/nonexistent/bg.png"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        image::RgbImage::from_pixel(40, 20, image::Rgb([9, 9, 9]))
            .save(&path)
            .unwrap();

        let s = Session::load(CutoutConfig::from_query("x=0.5&y=0.5&w=0.25&h=0.5"), &path).unwrap();
        assert_eq!(*s.target(), TargetBox::new(20.0, 10.0, 10.0, 10.0));
        assert_eq!(s.background().width(), 40);
    }
}
