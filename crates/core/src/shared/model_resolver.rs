use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create asset cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to store asset at {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine asset cache directory")]
    NoCacheDir,
}

/// Locates a tracker asset on disk, fetching it on first use.
///
/// Lookup order: user cache, then `bundled_dir`, then a download from
/// `url` into the user cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = asset_cache_dir()?;
    let cached = cache_dir.join(name);
    if cached.exists() {
        return Ok(cached);
    }

    if let Some(bundled) = bundled_dir.map(|dir| dir.join(name)) {
        if bundled.exists() {
            log::debug!("Using bundled asset {}", bundled.display());
            return Ok(bundled);
        }
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    download(url, &cached)?;
    Ok(cached)
}

/// Per-user cache directory for downloaded tracker assets.
///
/// macOS keeps it under the data dir (`~/Library/Application Support`),
/// every other platform under the cache dir.
pub fn asset_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("Face Cutout").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Fetches `url` into `dest` via a `.part` file so an interrupted download
/// never leaves a truncated asset behind.
fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let download_err = |source: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let store_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ModelResolveError::Store { path, source }
    };

    let bytes = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(download_err)?;

    let partial = dest.with_extension("part");
    let mut file = fs::File::create(&partial).map_err(store_err(&partial))?;
    file.write_all(&bytes).map_err(store_err(&partial))?;
    file.flush().map_err(store_err(&partial))?;
    drop(file);

    fs::rename(&partial, dest).map_err(store_err(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UNREACHABLE_URL: &str = "http://invalid.nonexistent.example.com/asset.onnx";

    #[test]
    fn test_resolve_uses_bundled_asset() {
        let tmp = TempDir::new().unwrap();
        let name = "cutout_resolver_bundled_asset.onnx";
        fs::write(tmp.path().join(name), b"bundled").unwrap();

        let resolved = resolve(name, UNREACHABLE_URL, Some(tmp.path())).unwrap();

        assert_eq!(fs::read(resolved).unwrap(), b"bundled");
    }

    #[test]
    fn test_resolve_missing_everywhere_reports_download_error() {
        let tmp = TempDir::new().unwrap();
        let result = resolve(
            "cutout_resolver_missing_asset.onnx",
            UNREACHABLE_URL,
            Some(tmp.path()),
        );
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
    }

    #[test]
    fn test_asset_cache_dir_is_namespaced() {
        let path = asset_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Face Cutout"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_failed_download_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("asset.onnx");
        assert!(download(UNREACHABLE_URL, &dest).is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
