use std::fmt::Display;
use std::path::{Path, PathBuf};

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("failed to open ONNX model {path}: {message}")]
pub struct OnnxSessionError {
    pub path: PathBuf,
    pub message: String,
}

/// Opens a model with the platform's accelerated provider registered.
///
/// ONNX Runtime runs on the CPU when the provider is missing at runtime.
pub fn open_session(model_path: &Path) -> Result<Session, OnnxSessionError> {
    let fail = |e: &dyn Display| OnnxSessionError {
        path: model_path.to_path_buf(),
        message: e.to_string(),
    };
    let providers = platform_providers();
    log::debug!(
        "Opening {} ({} accelerated provider(s))",
        model_path.display(),
        providers.len()
    );
    Session::builder()
        .map_err(|e| fail(&e))?
        .with_execution_providers(providers)
        .map_err(|e| fail(&e))?
        .commit_from_file(model_path)
        .map_err(|e| fail(&e))
}

fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_reports_path() {
        let err = open_session(Path::new("/nonexistent/face.onnx")).err().unwrap();
        assert_eq!(err.path, PathBuf::from("/nonexistent/face.onnx"));
        assert!(err.to_string().contains("/nonexistent/face.onnx"));
    }
}
