use std::io::Cursor;

use base64::Engine;
use thiserror::Error;

use crate::compositing::infrastructure::surface::Surface;
use crate::shared::constants::{SNAPSHOT_FILENAME, SNAPSHOT_LABEL};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("surface pixels do not form a {width}x{height} image")]
    Buffer { width: u32, height: u32 },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Lossless PNG copy of the output surface at one instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Snapshot {
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }

    pub fn filename(&self) -> &'static str {
        SNAPSHOT_FILENAME
    }

    pub fn label(&self) -> &'static str {
        SNAPSHOT_LABEL
    }
}

/// Encodes the current surface contents. The surface is left untouched.
pub fn capture(surface: &Surface) -> Result<Snapshot, CaptureError> {
    let (width, height) = (surface.width(), surface.height());
    let straight: Vec<u8> = surface
        .pixmap()
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    let rgba = image::RgbaImage::from_raw(width, height, straight)
        .ok_or(CaptureError::Buffer { width, height })?;

    let mut png = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(Snapshot { png, width, height })
}
