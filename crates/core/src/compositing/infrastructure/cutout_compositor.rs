use tiny_skia::BlendMode;

use crate::compositing::domain::scene_compositor::SceneCompositor;
use crate::geometry::rounded_ellipse::{rounded_ellipse, CORNER_RADIUS_FRACTION};
use crate::shared::region::{SourceBox, TargetBox};

use super::gradient::{black, concentric};
use super::raster_image::RasterImage;
use super::surface::Surface;

const BASE_INNER_RADIUS: f64 = 0.25;
const BASE_OUTER_RADIUS: f64 = 0.65;
const BASE_INNER_ALPHA: f32 = 0.6;
const BASE_OUTER_ALPHA: f32 = 0.15;

const EDGE_INNER_RADIUS: f64 = 0.4;
const EDGE_OUTER_RADIUS: f64 = 0.55;
const EDGE_ALPHA: f32 = 0.35;

/// Draws the background with a darkened elliptical hole, then the live
/// face clipped into that hole with a multiplied edge vignette.
#[derive(Clone, Copy, Debug, Default)]
pub struct CutoutCompositor;

impl CutoutCompositor {
    pub fn new() -> Self {
        Self
    }
}

fn cutout_path(target: &TargetBox) -> Option<tiny_skia::Path> {
    rounded_ellipse(
        target.x,
        target.y,
        target.width,
        target.height,
        target.min_side() * CORNER_RADIUS_FRACTION,
    )
    .to_path()
}

/// Whether any part of `source` falls on the frame.
fn overlaps_frame(source: &SourceBox, frame: &RasterImage) -> bool {
    !source.is_empty()
        && source.right() > 0.0
        && source.bottom() > 0.0
        && source.x < frame.width() as f64
        && source.y < frame.height() as f64
}

impl SceneCompositor for CutoutCompositor {
    fn draw_base(&self, surface: &mut Surface, background: &RasterImage, target: &TargetBox) {
        surface.reset_state();
        surface.clear();
        surface.draw_image_full(background);

        let Some(path) = cutout_path(target) else {
            return;
        };
        let shader = concentric(
            target.center(),
            BASE_INNER_RADIUS * target.min_side(),
            BASE_OUTER_RADIUS * target.max_side(),
            black(BASE_INNER_ALPHA),
            black(BASE_OUTER_ALPHA),
        );
        surface.fill_path(&path, shader);
    }

    fn draw_face_into_box(
        &self,
        surface: &mut Surface,
        live_frame: &RasterImage,
        target: &TargetBox,
        source: &SourceBox,
        feather: f64,
    ) {
        if !overlaps_frame(source, live_frame) {
            return;
        }
        let Some(path) = cutout_path(target) else {
            return;
        };

        let min_side = target.min_side();
        surface.save();
        surface.clip(&path);
        surface.draw_image(live_frame, source, target);

        surface.set_blend_mode(BlendMode::Multiply);
        let edge = concentric(
            target.center(),
            EDGE_INNER_RADIUS * min_side,
            EDGE_OUTER_RADIUS * min_side + feather * min_side,
            black(0.0),
            black(EDGE_ALPHA),
        );
        surface.fill_path(&path, edge);
        surface.restore();
    }
}
