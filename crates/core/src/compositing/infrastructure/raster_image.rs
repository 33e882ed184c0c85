use std::path::Path;

use thiserror::Error;
use tiny_skia::{IntSize, Pixmap};

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("raster dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("pixel buffer of {len} bytes does not match {width}x{height} with {channels} channels")]
    BufferSize {
        len: usize,
        width: u32,
        height: u32,
        channels: u8,
    },
    #[error("unsupported channel count: {0}")]
    Channels(u8),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Read-only raster in premultiplied RGBA, ready to be sampled by a surface.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pixmap: Pixmap,
}

impl RasterImage {
    /// Decodes an image file at its native resolution.
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_pixels(rgba.as_raw(), width, height, 4)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, RasterError> {
        Self::from_pixels(frame.data(), frame.width(), frame.height(), frame.channels())
    }

    /// Builds from straight-alpha RGB (3 channels) or RGBA (4 channels) bytes.
    pub fn from_pixels(
        data: &[u8],
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<Self, RasterError> {
        if channels != 3 && channels != 4 {
            return Err(RasterError::Channels(channels));
        }
        let size =
            IntSize::from_wh(width, height).ok_or(RasterError::ZeroSize { width, height })?;
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                len: data.len(),
                width,
                height,
                channels,
            });
        }

        let mut premultiplied = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for px in data.chunks_exact(channels as usize) {
            let a = if channels == 4 { px[3] } else { 255 };
            premultiplied.extend_from_slice(&[
                premultiply(px[0], a),
                premultiply(px[1], a),
                premultiply(px[2], a),
                a,
            ]);
        }

        let pixmap = Pixmap::from_vec(premultiplied, size)
            .ok_or(RasterError::ZeroSize { width, height })?;
        Ok(Self { pixmap })
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
}

fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u16 * a as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_frame_becomes_opaque() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, 0);
        let img = RasterImage::from_frame(&frame).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 1);
        assert_eq!(img.pixmap().data(), &[10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_rgba_is_premultiplied() {
        let img = RasterImage::from_pixels(&[200, 100, 0, 128], 1, 1, 4).unwrap();
        assert_eq!(img.pixmap().data(), &[100, 50, 0, 128]);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = RasterImage::from_pixels(&[], 0, 10, 4).unwrap_err();
        assert!(matches!(err, RasterError::ZeroSize { .. }));
    }

    #[test]
    fn test_buffer_mismatch_rejected() {
        let err = RasterImage::from_pixels(&[0; 5], 1, 1, 4).unwrap_err();
        assert!(matches!(err, RasterError::BufferSize { len: 5, .. }));
    }

    #[test]
    fn test_unsupported_channels_rejected() {
        let err = RasterImage::from_pixels(&[0; 2], 1, 1, 2).unwrap_err();
        assert!(matches!(err, RasterError::Channels(2)));
    }

    #[test]
    fn test_open_reads_png_at_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        image::RgbaImage::from_pixel(7, 5, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let img = RasterImage::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (7, 5));
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(RasterImage::open(Path::new("/nonexistent/bg.png")).is_err());
    }
}
