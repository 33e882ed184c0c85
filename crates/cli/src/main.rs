use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::Sender;

use cutout_core::camera::infrastructure::image_sequence_camera::ImageSequenceCamera;
use cutout_core::capture::snapshot_file_writer::SnapshotFileWriter;
use cutout_core::detection::infrastructure::locator_factory::open_native_detector;
use cutout_core::detection::infrastructure::onnx_landmark_tracker::OnnxTrackerLoader;
use cutout_core::detection::infrastructure::tracker_loader::{asset_locator, TrackerSource};
use cutout_core::render::frame_clock::FrameClock;
use cutout_core::render::render_loop::{RenderLoop, StopReason, UserCommand};
use cutout_core::render::session::Session;
use cutout_core::render::status_reporter::LogStatusReporter;
use cutout_core::shared::config::CutoutConfig;
use cutout_core::shared::constants::{DEFAULT_ASSET_BASE_URL, DEFAULT_TICK_RATE_HZ};

/// Composites a live face into a cutout on a background picture.
#[derive(Parser)]
#[command(name = "cutout")]
struct Cli {
    /// Background image; the output has its resolution.
    background: PathBuf,

    /// Directory of images played back as the camera feed.
    #[arg(long)]
    frames: PathBuf,

    /// Restart the camera feed after its last image.
    #[arg(long)]
    loop_frames: bool,

    /// Cutout placement, e.g. "x=0.70&y=0.25&w=0.2&h=0.2&feather=0.08".
    #[arg(long)]
    query: Option<String>,

    /// BlazeFace ONNX model for native face detection.
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Use the landmark tracker even when a native detector is available.
    #[arg(long)]
    tracker: bool,

    /// Directory searched for a bundled landmark model before downloading.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Base URL the landmark model is downloaded from.
    #[arg(long, default_value = DEFAULT_ASSET_BASE_URL)]
    asset_base_url: String,

    /// Render ticks per second.
    #[arg(long, default_value_t = DEFAULT_TICK_RATE_HZ)]
    fps: f64,

    /// Stop after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Where snapshots are written.
    #[arg(long, default_value = ".")]
    snapshot_dir: PathBuf,

    /// Read commands from stdin: Enter or s = snapshot, t = tracker, q = quit.
    #[arg(long)]
    interactive: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = cli
        .query
        .as_deref()
        .map(CutoutConfig::from_query)
        .unwrap_or_default();
    let session = Session::load(config, &cli.background)?;
    let camera = ImageSequenceCamera::new(&cli.frames).looping(cli.loop_frames);

    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    if cli.interactive {
        spawn_command_reader(command_tx);
        eprintln!("Commands: [Enter]/s snapshot, t landmark tracker, q quit");
    }

    let native = open_native_detector(cli.detector_model.as_deref());
    let tracker = TrackerSource::new(
        Arc::new(OnnxTrackerLoader::new(cli.models_dir.clone())),
        asset_locator(&cli.asset_base_url),
    );

    let mut render_loop = RenderLoop::new(session, Box::new(camera), command_rx)
        .with_reporter(Box::new(LogStatusReporter::new()))
        .with_snapshot_writer(SnapshotFileWriter::new(&cli.snapshot_dir));
    render_loop.start(native, Some(tracker), cli.tracker);
    log::info!("{}", render_loop.status().status);

    let mut clock = FrameClock::new(cli.fps);
    let reason = render_loop.run(&mut clock, cli.max_ticks);
    if reason == StopReason::CameraUnavailable {
        log::warn!("{}", render_loop.status().status);
    }

    write_exit_snapshot(&mut render_loop, &cli.snapshot_dir)?;
    log::info!("Final status: {}", render_loop.status());
    Ok(())
}

/// Saves the final frame unless the user already took a snapshot, which
/// would otherwise be overwritten. Returns whether a file was written.
fn write_exit_snapshot(
    render_loop: &mut RenderLoop,
    snapshot_dir: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    if let Some(taken) = render_loop.last_snapshot() {
        log::info!(
            "Keeping snapshot taken during the session: {}",
            snapshot_dir.join(taken.filename()).display()
        );
        return Ok(false);
    }
    let snapshot = render_loop.snapshot()?;
    log::info!(
        "{}: {} ({}x{})",
        snapshot.label(),
        snapshot_dir.join(snapshot.filename()).display(),
        snapshot.width(),
        snapshot.height()
    );
    Ok(true)
}

/// Forwards stdin lines as commands until stdin closes or the loop is gone.
fn spawn_command_reader(commands: Sender<UserCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if commands.send(command).is_err() {
                        return;
                    }
                }
                None => eprintln!("Unknown command {:?}", line.trim()),
            }
        }
        let _ = commands.send(UserCommand::Quit);
    });
}

fn parse_command(line: &str) -> Option<UserCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "snapshot" => Some(UserCommand::Snapshot),
        "t" | "tracker" => Some(UserCommand::UseTracker),
        "q" | "quit" => Some(UserCommand::Quit),
        _ => None,
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.background.exists() {
        return Err(format!("Background image not found: {}", cli.background.display()).into());
    }
    if let Some(model) = &cli.detector_model {
        if !model.exists() {
            return Err(format!("Detector model not found: {}", model.display()).into());
        }
    }
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("FPS must be a positive number, got {}", cli.fps).into());
    }
    if cli.max_ticks == Some(0) {
        return Err("--max-ticks must be at least 1".into());
    }
    Ok(())
}
