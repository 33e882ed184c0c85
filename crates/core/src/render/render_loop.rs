use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::camera::domain::camera::Camera;
use crate::capture::snapshot::{capture, CaptureError, Snapshot};
use crate::capture::snapshot_file_writer::SnapshotFileWriter;
use crate::compositing::domain::scene_compositor::SceneCompositor;
use crate::compositing::infrastructure::cutout_compositor::CutoutCompositor;
use crate::compositing::infrastructure::raster_image::RasterImage;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_locator::{FaceLocator, LocatorKind};
use crate::detection::infrastructure::locator_factory::{
    select_locator, tracker_locator, LocatorError, LocatorSelection,
};
use crate::detection::infrastructure::tracker_loader::{PendingTracker, TrackerSource};
use crate::shared::frame::Frame;
use crate::shared::region::SourceBox;

use super::frame_clock::FrameClock;
use super::session::Session;
use super::status::{SessionStatus, StatusReport};
use super::status_reporter::{NullStatusReporter, StatusReporter};

/// User actions delivered to the loop between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCommand {
    Snapshot,
    UseTracker,
    Quit,
}

/// Why [`RenderLoop::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    CameraEnded,
    CameraUnavailable,
    TickLimit,
}

/// Drives one session: redraws the scene every tick, asks the locator for
/// the face and composites it into the cutout.
///
/// The loop is the only writer of the output surface. Per-tick failures
/// are logged and surfaced as status; they never stop the loop.
pub struct RenderLoop {
    session: Session,
    compositor: Box<dyn SceneCompositor>,
    camera: Box<dyn Camera>,
    camera_open: bool,
    locator: Option<Box<dyn FaceLocator>>,
    tracker_source: Option<TrackerSource>,
    pending_tracker: Option<PendingTracker>,
    commands: Receiver<UserCommand>,
    reporter: Box<dyn StatusReporter>,
    snapshot_writer: Option<SnapshotFileWriter>,
    last_snapshot: Option<Snapshot>,
    report: StatusReport,
    ticks: u64,
    quit_requested: bool,
}

impl RenderLoop {
    pub fn new(session: Session, camera: Box<dyn Camera>, commands: Receiver<UserCommand>) -> Self {
        Self {
            session,
            compositor: Box::new(CutoutCompositor::new()),
            camera,
            camera_open: false,
            locator: None,
            tracker_source: None,
            pending_tracker: None,
            commands,
            reporter: Box::new(NullStatusReporter),
            snapshot_writer: None,
            last_snapshot: None,
            report: StatusReport::new(SessionStatus::AwaitingPermission),
            ticks: 0,
            quit_requested: false,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_compositor(mut self, compositor: Box<dyn SceneCompositor>) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn with_snapshot_writer(mut self, writer: SnapshotFileWriter) -> Self {
        self.snapshot_writer = Some(writer);
        self
    }

    /// Opens the camera, then sets up detection.
    ///
    /// Detection is only attempted once the camera is available. A tracker
    /// load runs in the background while ticks keep drawing. The tracker
    /// source is kept so the user can switch to it later.
    pub fn start(
        &mut self,
        native: Option<Box<dyn FaceDetector>>,
        tracker: Option<TrackerSource>,
        prefer_tracker: bool,
    ) {
        self.report = StatusReport::new(SessionStatus::AwaitingPermission);
        self.reporter.status(&self.report);
        if let Err(e) = self.camera.open() {
            log::error!("Camera unavailable: {e}");
            self.set_status(StatusReport::with_diagnostic(
                SessionStatus::PermissionDenied,
                e.to_string(),
            ));
            return;
        }
        self.camera_open = true;
        self.tracker_source = tracker;

        match select_locator(native, self.tracker_source.as_ref(), prefer_tracker) {
            Ok(LocatorSelection::Ready(locator)) => {
                self.locator = Some(locator);
                self.set_status(StatusReport::new(SessionStatus::Searching));
            }
            Ok(LocatorSelection::Loading(pending)) => {
                self.pending_tracker = Some(pending);
                self.set_status(StatusReport::with_diagnostic(
                    SessionStatus::Searching,
                    "loading landmark tracker",
                ));
            }
            Err(LocatorError::Unsupported) => {
                self.set_status(StatusReport::new(SessionStatus::DetectorUnsupported));
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &StatusReport {
        &self.report
    }

    pub fn locator_kind(&self) -> Option<LocatorKind> {
        self.locator.as_ref().map(|l| l.kind())
    }

    pub fn is_loading_tracker(&self) -> bool {
        self.pending_tracker.is_some()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    /// One frame of the session. Returns why the loop should stop, if it should.
    pub fn tick(&mut self) -> Option<StopReason> {
        self.handle_commands();
        if self.quit_requested {
            return Some(StopReason::Quit);
        }
        self.poll_pending_tracker();

        let frame = self.grab_frame();

        let started = Instant::now();
        self.session.draw_base(self.compositor.as_ref());
        self.reporter.timing("base", elapsed_ms(started));

        if let (Some(locator), Some(frame)) = (self.locator.as_mut(), frame.as_ref()) {
            let started = Instant::now();
            let located = locator.poll_latest_box(frame);
            self.reporter.timing("detect", elapsed_ms(started));

            match located {
                Ok(Some(source)) => {
                    self.composite(frame, &source);
                    self.set_status(StatusReport::with_diagnostic(
                        SessionStatus::FaceDetected,
                        format!("box {source}"),
                    ));
                }
                Ok(None) => self.set_status(StatusReport::new(SessionStatus::Searching)),
                Err(e) => {
                    log::warn!("Frame {}: {e}", frame.index());
                    self.set_status(StatusReport::with_diagnostic(
                        SessionStatus::DetectionError,
                        e.to_string(),
                    ));
                }
            }
        }

        self.ticks += 1;
        if !self.camera_open {
            Some(StopReason::CameraUnavailable)
        } else if self.camera.is_exhausted() {
            Some(StopReason::CameraEnded)
        } else {
            None
        }
    }

    /// Ticks until quit, camera exhaustion, or `max_ticks`, paced by `clock`.
    pub fn run(&mut self, clock: &mut FrameClock, max_ticks: Option<u64>) -> StopReason {
        let reason = loop {
            if let Some(reason) = self.tick() {
                break reason;
            }
            if max_ticks.is_some_and(|limit| self.ticks >= limit) {
                break StopReason::TickLimit;
            }
            clock.wait();
        };
        log::info!("Render loop stopped after {} ticks: {reason:?}", self.ticks);
        self.reporter.summary();
        reason
    }

    /// Encodes the surface as it stands and hands it to the snapshot writer.
    pub fn snapshot(&mut self) -> Result<&Snapshot, CaptureError> {
        let snapshot = capture(self.session.surface())?;
        if let Some(writer) = &self.snapshot_writer {
            writer.write(&snapshot)?;
        }
        Ok(&*self.last_snapshot.insert(snapshot))
    }

    /// Starts loading the landmark tracker to replace the current locator.
    ///
    /// The current locator keeps running until the tracker is ready. Does
    /// nothing without a camera, without a tracker source, while a load is
    /// already running, or after a previous tracker load failed.
    pub fn switch_to_tracker(&mut self) {
        if !self.camera_open || self.report.status == SessionStatus::TrackerLoadFailed {
            log::info!("Ignoring tracker switch: {}", self.report.status);
            return;
        }
        if self.pending_tracker.is_some() || self.locator_kind() == Some(LocatorKind::Tracker) {
            return;
        }
        let Some(source) = self.tracker_source.as_ref() else {
            log::warn!("Landmark tracker is not available in this session");
            return;
        };
        log::info!("Loading landmark tracker");
        self.pending_tracker = Some(source.begin_load());
    }

    /// Installs the tracker once its load finishes, or fails the session's
    /// detection when the load errors or runs past its deadline.
    fn poll_pending_tracker(&mut self) {
        let Some(outcome) = self.pending_tracker.as_ref().and_then(|p| p.poll()) else {
            return;
        };
        self.pending_tracker = None;
        match outcome {
            Ok(tracker) => {
                log::info!("Switched to landmark tracker");
                self.locator = Some(tracker_locator(tracker));
                self.set_status(StatusReport::new(SessionStatus::Searching));
            }
            Err(e) => {
                log::error!("{e}");
                self.locator = None;
                self.set_status(StatusReport::with_diagnostic(
                    SessionStatus::TrackerLoadFailed,
                    e.to_string(),
                ));
            }
        }
    }

    fn handle_commands(&mut self) {
        let pending: Vec<UserCommand> = self.commands.try_iter().collect();
        for command in pending {
            match command {
                UserCommand::Snapshot => {
                    if let Err(e) = self.snapshot() {
                        log::warn!("Snapshot failed: {e}");
                    }
                }
                UserCommand::UseTracker => self.switch_to_tracker(),
                UserCommand::Quit => self.quit_requested = true,
            }
        }
    }

    fn grab_frame(&mut self) -> Option<Frame> {
        if !self.camera_open {
            return None;
        }
        match self.camera.grab() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    fn composite(&mut self, frame: &Frame, source: &SourceBox) {
        let started = Instant::now();
        match RasterImage::from_frame(frame) {
            Ok(live) => self
                .session
                .draw_face(self.compositor.as_ref(), &live, source),
            Err(e) => log::warn!("Frame {} cannot be sampled: {e}", frame.index()),
        }
        self.reporter.timing("composite", elapsed_ms(started));
    }

    /// Records the new status, notifying the reporter when it changed.
    fn set_status(&mut self, report: StatusReport) {
        let changed = report.status != self.report.status;
        if let Some(d) = &report.diagnostic {
            log::debug!("{}: {d}", report.status);
        }
        self.report = report;
        if changed {
            self.reporter.status(&self.report);
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
