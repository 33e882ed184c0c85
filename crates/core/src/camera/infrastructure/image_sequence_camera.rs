use std::path::{Path, PathBuf};

use crate::camera::domain::camera::{Camera, CameraError};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Plays a directory of still images as a camera feed, in file-name order.
pub struct ImageSequenceCamera {
    dir: PathBuf,
    looping: bool,
    files: Vec<PathBuf>,
    position: usize,
    next_index: usize,
    opened: bool,
}

impl ImageSequenceCamera {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            looping: false,
            files: Vec::new(),
            position: 0,
            next_index: 0,
            opened: false,
        }
    }

    /// Restart from the first image once the last one has been shown.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode(path: &Path, index: usize) -> Result<Frame, CameraError> {
    let rgb = image::open(path)
        .map_err(|e| CameraError::Read(format!("{}: {e}", path.display())))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3, index))
}

impl Camera for ImageSequenceCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| CameraError::Denied(format!("{}: {e}", self.dir.display())))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(CameraError::Denied(format!(
                "no images in {}",
                self.dir.display()
            )));
        }

        log::info!(
            "Camera opened: {} frames from {}",
            files.len(),
            self.dir.display()
        );
        self.files = files;
        self.position = 0;
        self.opened = true;
        Ok(())
    }

    fn grab(&mut self) -> Result<Option<Frame>, CameraError> {
        if !self.opened || self.is_exhausted() {
            return Ok(None);
        }
        if self.position >= self.files.len() {
            self.position = 0;
        }
        let path = &self.files[self.position];
        self.position += 1;
        let frame = decode(path, self.next_index)?;
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn is_exhausted(&self) -> bool {
        self.opened && !self.looping && self.position >= self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, value: u8) {
        image::RgbImage::from_pixel(w, h, image::Rgb([value, value, value]))
            .save(dir.join(name))
            .unwrap();
    }

    fn sequence() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png", 4, 3, 20);
        write_png(dir.path(), "a.png", 4, 3, 10);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();
        dir
    }

    #[test]
    fn test_missing_directory_is_denied() {
        let mut cam = ImageSequenceCamera::new(Path::new("/nonexistent/frames"));
        assert!(matches!(cam.open(), Err(CameraError::Denied(_))));
    }

    #[test]
    fn test_empty_directory_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let mut cam = ImageSequenceCamera::new(dir.path());
        assert!(matches!(cam.open(), Err(CameraError::Denied(_))));
    }

    #[test]
    fn test_grab_before_open_yields_nothing() {
        let dir = sequence();
        let mut cam = ImageSequenceCamera::new(dir.path());
        assert!(cam.grab().unwrap().is_none());
        assert!(!cam.is_exhausted());
    }

    #[test]
    fn test_frames_play_in_name_order_then_end() {
        let dir = sequence();
        let mut cam = ImageSequenceCamera::new(dir.path());
        cam.open().unwrap();
        assert_eq!(cam.len(), 2);

        let first = cam.grab().unwrap().unwrap();
        assert_eq!((first.width(), first.height(), first.channels()), (4, 3, 3));
        assert_eq!(first.data()[0], 10);
        assert_eq!(first.index(), 0);

        let second = cam.grab().unwrap().unwrap();
        assert_eq!(second.data()[0], 20);
        assert_eq!(second.index(), 1);

        assert!(cam.is_exhausted());
        assert!(cam.grab().unwrap().is_none());
    }

    #[test]
    fn test_looping_wraps_with_increasing_index() {
        let dir = sequence();
        let mut cam = ImageSequenceCamera::new(dir.path()).looping(true);
        cam.open().unwrap();
        let indices: Vec<usize> = (0..5)
            .map(|_| cam.grab().unwrap().unwrap().index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(!cam.is_exhausted());
    }

    #[test]
    fn test_corrupt_frame_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let mut cam = ImageSequenceCamera::new(dir.path());
        cam.open().unwrap();
        assert!(matches!(cam.grab(), Err(CameraError::Read(_))));
    }
}
