//! Laboratory Frame Capture CLI
//!
//! `lab-capture capture` records infrared frames with a live preview;
//! `lab-capture alt` runs an Activity Level Tracking experiment.

use clap::{Args, Parser, Subcommand};
use lab_capture::{
    alt::{AltError, AltLogger, SimulatedMotionCamera},
    capture::{CameraSession, ConfigError, FileConfig, SimulatedCamera},
    display::{Display, DisplayError, HeadlessDisplay, QuitKey, SnapshotDisplay},
    metrics::{CaptureProgress, MetricsError, MetricsRegistry, MetricsSnapshot},
    pipeline::{CaptureError, CaptureSession},
    recording::RecordingLayout,
    sharing::StopSignal,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "lab-capture", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record infrared frames and show a live preview.
    Capture(CaptureArgs),
    /// Run an Activity Level Tracking experiment.
    Alt(AltArgs),
}

#[derive(Debug, Args)]
struct CaptureArgs {
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    fps: Option<u32>,
    /// Capture duration in seconds.
    #[arg(long)]
    duration: Option<u32>,
    /// Seconds between preview updates.
    #[arg(long)]
    publish_interval: Option<f64>,
    /// Directory receiving the frames directory and metadata file.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Preview image path.
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Log previews instead of writing an image.
    #[arg(long)]
    headless: bool,
    /// Use generated frames instead of a camera.
    #[arg(long)]
    simulate: bool,
    /// Serve Prometheus metrics on this port.
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[derive(Debug, Args)]
struct AltArgs {
    #[arg(long)]
    hours: Option<f64>,
    #[arg(long)]
    slice_minutes: Option<f64>,
    /// Experiment root; must not exist yet.
    #[arg(long)]
    experiment_dir: Option<PathBuf>,
    /// Replace key-frame zeros with the previous sSAD.
    #[arg(long)]
    fill_key_frames: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Alt(#[from] AltError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("this build has no camera support; rebuild with --features camera or pass --simulate")]
    NoCameraBackend,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Lab Capture v{}", lab_capture::VERSION);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let file_config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Command::Capture(args) => run_capture(file_config, args),
        Command::Alt(args) => run_alt(file_config, args),
    }
}

/// Routes Ctrl-C to `stop`; workers finish their current iteration and exit.
fn install_stop_handler(stop: StopSignal) -> Result<(), AppError> {
    ctrlc::set_handler(move || {
        if stop.request_stop() {
            warn!("Interrupted; finishing current iteration");
        }
    })?;
    Ok(())
}

fn run_capture(mut file: FileConfig, args: CaptureArgs) -> Result<(), AppError> {
    let capture = &mut file.capture;
    if let Some(v) = args.width {
        capture.width = v;
    }
    if let Some(v) = args.height {
        capture.height = v;
    }
    if let Some(v) = args.fps {
        capture.fps = v;
    }
    if let Some(v) = args.duration {
        capture.duration_secs = v;
    }
    if let Some(v) = args.publish_interval {
        file.display.publish_interval_secs = v;
    }
    if let Some(v) = args.output {
        file.output.root = v;
    }
    if let Some(v) = args.preview {
        file.display.preview_path = v;
    }
    if let Some(v) = args.metrics_port {
        file.output.metrics_port = v;
    }
    file.display.headless |= args.headless;
    file.capture.validate()?;

    let session = CaptureSession::new(
        file.capture.clone(),
        file.display.publish_interval(),
        RecordingLayout::now(&file.output.root),
    )?;

    install_stop_handler(session.stop_signal())?;

    let registry = Arc::new(MetricsRegistry::new()?);
    if file.output.metrics_port != 0 {
        serve_metrics(
            file.output.metrics_port,
            Arc::clone(&registry),
            session.progress(),
            session.stop_signal(),
        );
    }

    let make_camera = camera_factory(args.simulate)?;
    let display_config = file.display.clone();
    let report = session.run(
        make_camera,
        move || -> Result<Box<dyn Display>, DisplayError> {
            let quit = QuitKey::watch_stdin('q');
            if display_config.headless {
                Ok(Box::new(HeadlessDisplay::new(
                    display_config.refresh_interval(),
                    quit,
                )))
            } else {
                Ok(Box::new(SnapshotDisplay::open(
                    &display_config.preview_path,
                    display_config.refresh_interval(),
                    quit,
                )?))
            }
        },
    )?;

    registry.update(&MetricsSnapshot::from_progress(&session.progress()));
    if let Ok(text) = registry.encode() {
        tracing::debug!(metrics = %text, "Final metrics");
    }

    info!(
        frames = report.capture.frames_captured,
        published = report.capture.frames_published,
        bytes = report.capture.bytes_written,
        frames_dir = %report.layout.frames_dir.display(),
        metadata = %report.layout.metadata_file.display(),
        "Capture complete"
    );
    if let Err(e) = report.display {
        warn!("Preview failed during the run: {}", e);
    }
    Ok(())
}

/// Picks the camera constructor. Device handles are thread-bound, so the
/// camera itself is built on the capture thread.
fn camera_factory(simulate: bool) -> Result<fn() -> Box<dyn CameraSession>, AppError> {
    fn simulated() -> Box<dyn CameraSession> {
        Box::new(SimulatedCamera::new().paced())
    }

    if simulate {
        info!("Using simulated camera");
        return Ok(simulated);
    }
    #[cfg(feature = "camera")]
    {
        fn device() -> Box<dyn CameraSession> {
            Box::new(lab_capture::capture::DeviceCamera::new())
        }
        Ok(device)
    }
    #[cfg(not(feature = "camera"))]
    {
        Err(AppError::NoCameraBackend)
    }
}

#[cfg(feature = "metrics")]
fn serve_metrics(
    port: u16,
    registry: Arc<MetricsRegistry>,
    progress: Arc<CaptureProgress>,
    stop: StopSignal,
) {
    use lab_capture::metrics::{MetricsServer, MetricsServerConfig};

    let server = MetricsServer::new(
        MetricsServerConfig::with_port(port),
        Arc::clone(&registry),
        stop.clone(),
    );
    let spawned = std::thread::Builder::new()
        .name("metrics-server".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("Metrics runtime failed to start: {}", e);
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                warn!("Metrics server stopped: {}", e);
            }
        });
    if let Err(e) = spawned {
        warn!("Metrics server thread failed to start: {}", e);
        return;
    }

    let updater = std::thread::Builder::new()
        .name("metrics-update".into())
        .spawn(move || {
            while !stop.is_stopped() {
                registry.update(&MetricsSnapshot::from_progress(&progress));
                std::thread::sleep(std::time::Duration::from_secs(1));
            }
            registry.update(&MetricsSnapshot::from_progress(&progress));
        });
    if let Err(e) = updater {
        warn!("Metrics update thread failed to start: {}", e);
    }
}

#[cfg(not(feature = "metrics"))]
fn serve_metrics(
    port: u16,
    _registry: Arc<MetricsRegistry>,
    _progress: Arc<CaptureProgress>,
    _stop: StopSignal,
) {
    warn!(port, "Metrics server requested but this build lacks the `metrics` feature");
}

fn run_alt(mut file: FileConfig, args: AltArgs) -> Result<(), AppError> {
    let alt = &mut file.alt;
    if let Some(v) = args.hours {
        alt.experiment_hours = v;
    }
    if let Some(v) = args.slice_minutes {
        alt.slice_minutes = v;
    }
    if let Some(v) = args.experiment_dir {
        alt.experiment_dir = v;
    }
    alt.fill_key_frames |= args.fill_key_frames;
    alt.validate()?;

    let stop = StopSignal::new();
    install_stop_handler(stop.clone())?;

    warn!("No motion camera backend is available; recording simulated motion data");
    let mut logger = AltLogger::new(SimulatedMotionCamera::new().paced(), alt.clone(), stop);
    let summary = logger.run()?;

    info!(
        slices = summary.slices.len(),
        stopped_early = summary.stopped_early,
        "Experiment complete"
    );
    Ok(())
}
