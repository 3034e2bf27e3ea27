//! One capture run: output files, camera, capture worker and display worker.

use super::{
    run_capture_loop, run_display_loop, CaptureError, CaptureLoopConfig, CaptureSummary,
    DisplaySummary,
};
use crate::capture::{CameraSession, CaptureConfig};
use crate::display::{Display, DisplayError};
use crate::metrics::CaptureProgress;
use crate::recording::{FrameWriter, RecordingLayout, TimestampLog};
use crate::sharing::{SharedFrameBuffer, StopSignal};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// Outcome of a session whose capture side succeeded.
#[derive(Debug)]
pub struct SessionReport {
    pub capture: CaptureSummary,
    /// A failed preview does not fail the session.
    pub display: Result<DisplaySummary, DisplayError>,
    pub layout: RecordingLayout,
}

/// Owns the state the two workers share.
pub struct CaptureSession {
    config: CaptureConfig,
    publish_interval: Duration,
    layout: RecordingLayout,
    buffer: Arc<SharedFrameBuffer>,
    stop: StopSignal,
    progress: Arc<CaptureProgress>,
}

impl CaptureSession {
    /// Validates `config` and allocates the shared buffer.
    pub fn new(
        config: CaptureConfig,
        publish_interval: Duration,
        layout: RecordingLayout,
    ) -> Result<Self, CaptureError> {
        config.validate()?;
        let buffer = Arc::new(SharedFrameBuffer::new(config.frame_bytes()));
        Ok(Self {
            config,
            publish_interval,
            layout,
            buffer,
            stop: StopSignal::new(),
            progress: Arc::new(CaptureProgress::new()),
        })
    }

    /// Handle that stops both workers when set.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn buffer(&self) -> Arc<SharedFrameBuffer> {
        Arc::clone(&self.buffer)
    }

    pub fn progress(&self) -> Arc<CaptureProgress> {
        Arc::clone(&self.progress)
    }

    pub fn layout(&self) -> &RecordingLayout {
        &self.layout
    }

    /// Runs capture and preview on two threads until both finish.
    ///
    /// Output files are created first, then the camera is built and opened
    /// on the capture thread. Any failure up to that point aborts before
    /// the preview starts. The display is built on its own thread, so a
    /// display that fails to start leaves capture running. When capture
    /// ends for any reason the stop signal is set so the preview exits too.
    pub fn run<C, D, MC, MD>(
        &self,
        make_camera: MC,
        make_display: MD,
    ) -> Result<SessionReport, CaptureError>
    where
        C: CameraSession,
        D: Display,
        MC: FnOnce() -> C + Send,
        MD: FnOnce() -> Result<D, DisplayError> + Send,
    {
        // Refuses to reuse a layout, so an earlier run's record survives.
        let mut log = TimestampLog::create(&self.layout.metadata_file)?;
        let mut writer = FrameWriter::create(&self.layout.frames_dir)?;

        let loop_config = CaptureLoopConfig {
            target_frames: self.config.target_frames(),
            publish_interval: self.publish_interval,
        };
        let buffer = &*self.buffer;
        let progress = &*self.progress;
        let stop = &self.stop;
        let config = &self.config;

        tracing::info!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            target_frames = loop_config.target_frames,
            metadata = %self.layout.metadata_file.display(),
            "Starting capture session"
        );

        thread::scope(|s| {
            let (ready_tx, ready_rx) = mpsc::channel::<bool>();

            let capture = thread::Builder::new()
                .name("capture".into())
                .spawn_scoped(s, move || {
                    let _stop = stop.stop_on_drop();
                    capture_worker(
                        make_camera,
                        config,
                        &loop_config,
                        buffer,
                        stop,
                        &mut writer,
                        &mut log,
                        progress,
                        ready_tx,
                    )
                })
                .map_err(|e| CaptureError::Spawn("capture", e))?;

            if ready_rx.recv() != Ok(true) {
                return Err(match capture.join() {
                    Ok(Err(e)) => e,
                    _ => CaptureError::WorkerPanicked("capture"),
                });
            }

            let (width, height) = (config.width, config.height);
            let display = thread::Builder::new()
                .name("display".into())
                .spawn_scoped(s, move || {
                    let mut display = make_display().map_err(|e| {
                        tracing::error!(error = %e, "Preview unavailable; recording continues");
                        e
                    })?;
                    run_display_loop(&mut display, buffer, stop, width, height, progress)
                });

            let capture_result = capture
                .join()
                .unwrap_or(Err(CaptureError::WorkerPanicked("capture")));

            let display_result = match display {
                Ok(handle) => handle.join().unwrap_or(Err(DisplayError::WorkerPanicked)),
                Err(e) => Err(DisplayError::InitFailed(e.to_string())),
            };
            if let Err(ref e) = display_result {
                tracing::warn!(error = %e, "Preview ended with an error");
            }

            let capture = capture_result?;
            tracing::info!(
                captured = capture.frames_captured,
                published = capture.frames_published,
                "Capture session complete"
            );
            Ok(SessionReport {
                capture,
                display: display_result,
                layout: self.layout.clone(),
            })
        })
    }
}

/// Opens the camera, reports readiness, then runs the capture loop.
#[allow(clippy::too_many_arguments)]
fn capture_worker<C, MC>(
    make_camera: MC,
    config: &CaptureConfig,
    loop_config: &CaptureLoopConfig,
    buffer: &SharedFrameBuffer,
    stop: &StopSignal,
    writer: &mut FrameWriter,
    log: &mut TimestampLog,
    progress: &CaptureProgress,
    ready: mpsc::Sender<bool>,
) -> Result<CaptureSummary, CaptureError>
where
    C: CameraSession,
    MC: FnOnce() -> C,
{
    let mut camera = make_camera();
    if let Err(e) = camera.open(config) {
        tracing::error!(error = %e, "Camera unavailable");
        let _ = ready.send(false);
        return Err(e.into());
    }
    let _ = ready.send(true);

    run_capture_loop(&mut camera, loop_config, buffer, stop, writer, log, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SimulatedCamera;
    use crate::display::{HeadlessDisplay, QuitKey};

    fn config(width: u32, height: u32, fps: u32, secs: u32) -> CaptureConfig {
        CaptureConfig {
            fps,
            duration_secs: secs,
            ..CaptureConfig::with_dimensions(width, height)
        }
    }

    #[test]
    fn test_session_runs_to_target() {
        let tmp = tempfile::tempdir().unwrap();
        let session = CaptureSession::new(
            config(8, 6, 30, 1),
            Duration::ZERO,
            RecordingLayout::now(tmp.path()),
        )
        .unwrap();

        let report = session
            .run(SimulatedCamera::new, || {
                Ok(HeadlessDisplay::new(Duration::from_millis(1), QuitKey::manual()))
            })
            .unwrap();

        assert_eq!(report.capture.frames_captured, 30);
        assert!(report.capture.reached_target);
        assert!(report.display.is_ok());
        assert!(session.stop_signal().is_stopped());
        assert_eq!(session.progress().frames_captured(), 30);
    }

    #[test]
    fn test_camera_open_failure_aborts_before_preview() {
        let tmp = tempfile::tempdir().unwrap();
        let session = CaptureSession::new(
            config(8, 6, 30, 1),
            Duration::ZERO,
            RecordingLayout::now(tmp.path()),
        )
        .unwrap();

        struct Unplugged;
        impl CameraSession for Unplugged {
            fn open(&mut self, _: &CaptureConfig) -> Result<(), crate::capture::CameraError> {
                Err(crate::capture::CameraError::DeviceNotFound("no device".into()))
            }
            fn next_frame(&mut self) -> Result<crate::capture::Frame, crate::capture::CameraError> {
                Err(crate::capture::CameraError::NotInitialized)
            }
            fn is_open(&self) -> bool {
                false
            }
            fn close(&mut self) {}
        }

        let display_built = std::sync::atomic::AtomicBool::new(false);
        let result = session.run(
            || Unplugged,
            || {
                display_built.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(HeadlessDisplay::new(Duration::ZERO, QuitKey::manual()))
            },
        );

        assert!(matches!(
            result,
            Err(CaptureError::Camera(crate::capture::CameraError::DeviceNotFound(_)))
        ));
        assert!(!display_built.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_display_failure_does_not_stop_capture() {
        let tmp = tempfile::tempdir().unwrap();
        let session = CaptureSession::new(
            config(8, 6, 30, 1),
            Duration::ZERO,
            RecordingLayout::now(tmp.path()),
        )
        .unwrap();

        let report = session
            .run(SimulatedCamera::new, || {
                Err::<HeadlessDisplay, _>(DisplayError::InitFailed("no screen".into()))
            })
            .unwrap();

        assert_eq!(report.capture.frames_captured, 30);
        assert!(matches!(report.display, Err(DisplayError::InitFailed(_))));
    }

    #[test]
    fn test_second_run_keeps_first_record() {
        let tmp = tempfile::tempdir().unwrap();
        let session = CaptureSession::new(
            config(8, 6, 10, 1),
            Duration::ZERO,
            RecordingLayout::now(tmp.path()),
        )
        .unwrap();
        let headless = || Ok(HeadlessDisplay::new(Duration::ZERO, QuitKey::manual()));

        session.run(SimulatedCamera::new, headless).unwrap();
        let metadata = session.layout().metadata_file.clone();
        let before = std::fs::read_to_string(&metadata).unwrap();
        assert_eq!(before.lines().count(), 10);

        let again = session.run(SimulatedCamera::new, headless);
        assert!(matches!(again, Err(CaptureError::Record(_))));
        assert_eq!(std::fs::read_to_string(&metadata).unwrap(), before);
        assert_eq!(
            std::fs::read_dir(&session.layout().frames_dir).unwrap().count(),
            10
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let result = CaptureSession::new(
            config(0, 6, 30, 1),
            Duration::ZERO,
            RecordingLayout::now(tmp.path()),
        );
        assert!(matches!(result, Err(CaptureError::Config(_))));
    }
}
