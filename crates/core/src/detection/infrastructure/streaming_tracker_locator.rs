use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::detection::domain::face_locator::{DetectionError, FaceLocator, LocatorKind};
use crate::detection::domain::landmark_bounds::landmark_bounds;
use crate::detection::domain::landmark_tracker::{LandmarkSet, LandmarkTracker};
use crate::shared::constants::LANDMARK_PADDING;
use crate::shared::frame::Frame;
use crate::shared::region::SourceBox;

/// How long dropping the locator waits for an in-flight frame to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// One tracker answer, tagged with the resolution it was computed on.
struct TrackerOutput {
    frame_width: u32,
    frame_height: u32,
    result: Result<Vec<LandmarkSet>, String>,
}

/// Runs a landmark tracker on its own thread and caches its latest box.
///
/// Frames are offered through a single slot: while the tracker is busy,
/// newer frames are dropped rather than queued, so detection and rendering
/// run at their own rates. Results are applied on the polling thread in the
/// order the tracker produced them.
pub struct StreamingTrackerLocator {
    frames: Option<Sender<Frame>>,
    results: Receiver<TrackerOutput>,
    worker: Option<JoinHandle<()>>,
    cached: Option<SourceBox>,
}

impl StreamingTrackerLocator {
    pub fn new(tracker: Box<dyn LandmarkTracker>) -> Self {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(1);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<TrackerOutput>();
        let worker = spawn_tracker(tracker, frame_rx, result_tx);
        Self {
            frames: Some(frame_tx),
            results: result_rx,
            worker: Some(worker),
            cached: None,
        }
    }

    /// Hands `frame` to the tracker unless it is still busy with an older one.
    fn offer(&self, frame: &Frame) -> Result<(), DetectionError> {
        let Some(frames) = self.frames.as_ref() else {
            return Err(DetectionError::TrackerStopped);
        };
        if frames.is_full() {
            return Ok(());
        }
        match frames.try_send(frame.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(DetectionError::TrackerStopped),
        }
    }

    /// Applies every result that arrived since the last poll.
    fn drain(&mut self) -> Option<DetectionError> {
        let mut failure = None;
        for output in self.results.try_iter() {
            match output.result {
                Ok(sets) => {
                    self.cached = sets
                        .first()
                        .and_then(|set| landmark_bounds(set, LANDMARK_PADDING))
                        .map(|b| b.to_source(output.frame_width, output.frame_height));
                }
                Err(message) => {
                    self.cached = None;
                    failure = Some(DetectionError::Tracker(message));
                }
            }
        }
        failure
    }
}

impl FaceLocator for StreamingTrackerLocator {
    fn poll_latest_box(&mut self, frame: &Frame) -> Result<Option<SourceBox>, DetectionError> {
        let offered = if frame.has_data() {
            self.offer(frame)
        } else {
            Ok(())
        };
        let failure = self.drain();

        if let Err(e) = offered {
            self.cached = None;
            return Err(e);
        }
        if let Some(e) = failure {
            return Err(e);
        }
        if let Some(b) = &self.cached {
            log::debug!("Tracker box: {b}");
        }
        Ok(self.cached)
    }

    fn kind(&self) -> LocatorKind {
        LocatorKind::Tracker
    }
}

impl Drop for StreamingTrackerLocator {
    fn drop(&mut self) {
        // Closing the frame channel ends the worker's receive loop.
        self.frames.take();
        let Some(worker) = self.worker.take() else {
            return;
        };
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                log::warn!(
                    "Landmark tracker worker still busy after {SHUTDOWN_GRACE:?}; detaching it"
                );
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        if worker.join().is_err() {
            log::warn!("Landmark tracker worker panicked");
        }
    }
}

fn spawn_tracker(
    mut tracker: Box<dyn LandmarkTracker>,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<TrackerOutput>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for frame in frame_rx.iter() {
            let result = tracker.process(&frame).map_err(|e| e.to_string());
            let output = TrackerOutput {
                frame_width: frame.width(),
                frame_height: frame.height(),
                result,
            };
            if result_tx.send(output).is_err() {
                break;
            }
        }
        log::debug!("Landmark tracker worker stopped");
    })
}
