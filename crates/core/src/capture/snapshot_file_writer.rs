use std::path::{Path, PathBuf};

use super::snapshot::{CaptureError, Snapshot};

/// Saves snapshots under a fixed directory with the download filename.
pub struct SnapshotFileWriter {
    dir: PathBuf,
}

impl SnapshotFileWriter {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Writes `snapshot`, replacing any earlier one, and returns its path.
    pub fn write(&self, snapshot: &Snapshot) -> Result<PathBuf, CaptureError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(snapshot.filename());
        std::fs::write(&path, snapshot.png_bytes())?;
        log::info!("{}: {}", snapshot.label(), path.display());
        Ok(path)
    }
}
