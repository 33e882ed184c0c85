use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use thiserror::Error;

use crate::detection::domain::landmark_tracker::{
    AssetLocator, LandmarkTracker, TrackerLoader, TrackerOptions,
};
use crate::shared::constants::TRACKER_LOAD_TIMEOUT_SECS;

#[derive(Error, Debug)]
pub enum TrackerLoadError {
    #[error("landmark tracker failed to load: {0}")]
    Failed(String),
    #[error("landmark tracker did not load within {0:?}")]
    TimedOut(Duration),
    #[error("landmark tracker loader exited without a result")]
    Abandoned,
}

pub fn default_load_timeout() -> Duration {
    Duration::from_secs(TRACKER_LOAD_TIMEOUT_SECS)
}

/// Asset locator resolving file names against `base_url`.
pub fn asset_locator(base_url: &str) -> AssetLocator {
    let base = base_url.trim_end_matches('/').to_string();
    Arc::new(move |file: &str| format!("{base}/{file}"))
}

/// Everything needed to bring up the landmark tracker on demand.
#[derive(Clone)]
pub struct TrackerSource {
    loader: Arc<dyn TrackerLoader>,
    locate_asset: AssetLocator,
    options: TrackerOptions,
    timeout: Duration,
}

impl TrackerSource {
    pub fn new(loader: Arc<dyn TrackerLoader>, locate_asset: AssetLocator) -> Self {
        Self {
            loader,
            locate_asset,
            options: TrackerOptions::default(),
            timeout: default_load_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Starts loading the tracker in the background.
    pub fn begin_load(&self) -> PendingTracker {
        spawn_load(
            Arc::clone(&self.loader),
            self.options,
            Arc::clone(&self.locate_asset),
            self.timeout,
        )
    }
}

type LoadOutcome = Result<Box<dyn LandmarkTracker>, String>;

/// A tracker load in flight, bounded by a deadline.
pub struct PendingTracker {
    result: Receiver<LoadOutcome>,
    deadline: Instant,
    timeout: Duration,
}

impl PendingTracker {
    /// Non-blocking check. `None` while the loader is still running and the
    /// deadline has not passed.
    pub fn poll(&self) -> Option<Result<Box<dyn LandmarkTracker>, TrackerLoadError>> {
        match self.result.try_recv() {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(TryRecvError::Disconnected) => Some(Err(TrackerLoadError::Abandoned)),
            Err(TryRecvError::Empty) if Instant::now() >= self.deadline => {
                Some(Err(TrackerLoadError::TimedOut(self.timeout)))
            }
            Err(TryRecvError::Empty) => None,
        }
    }

    /// Blocks until the loader answers or the deadline passes.
    pub fn wait(self) -> Result<Box<dyn LandmarkTracker>, TrackerLoadError> {
        match self.result.recv_deadline(self.deadline) {
            Ok(outcome) => self.finish(outcome),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                Err(TrackerLoadError::TimedOut(self.timeout))
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(TrackerLoadError::Abandoned)
            }
        }
    }

    fn finish(&self, outcome: LoadOutcome) -> Result<Box<dyn LandmarkTracker>, TrackerLoadError> {
        match outcome {
            Ok(tracker) => {
                log::info!("Landmark tracker loaded");
                Ok(tracker)
            }
            Err(message) => Err(TrackerLoadError::Failed(message)),
        }
    }
}

/// Runs `loader` on its own thread. The result is accepted until `timeout`
/// elapses; a loader still running after that is left detached and its
/// eventual result is discarded.
pub fn spawn_load(
    loader: Arc<dyn TrackerLoader>,
    options: TrackerOptions,
    locate_asset: AssetLocator,
    timeout: Duration,
) -> PendingTracker {
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let result = loader
            .load(&options, &locate_asset)
            .map_err(|e| e.to_string());
        let _ = tx.send(result);
    });
    PendingTracker {
        result: rx,
        deadline: Instant::now() + timeout,
        timeout,
    }
}
