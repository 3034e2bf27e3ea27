//! Frame capture worker.

use crate::capture::{CameraError, CameraSession};
use crate::metrics::CaptureProgress;
use crate::recording::{FrameWriter, RecordError, TimestampLog};
use crate::sharing::{SharedFrameBuffer, SharingError, StopSignal};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that end a capture run.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Sharing(#[from] SharingError),
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::capture::ConfigError),
    #[error("frame {number} has {got} bytes, expected {expected}")]
    InvalidFrame {
        number: u64,
        got: usize,
        expected: usize,
    },
    #[error("failed to start {0} worker: {1}")]
    Spawn(&'static str, std::io::Error),
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

/// Parameters of the capture worker.
#[derive(Debug, Clone)]
pub struct CaptureLoopConfig {
    /// Stop after this many frames. Zero runs until stopped externally.
    pub target_frames: u64,
    /// Minimum wall-clock time between two preview publications.
    pub publish_interval: Duration,
}

impl Default for CaptureLoopConfig {
    fn default() -> Self {
        Self {
            target_frames: 0,
            publish_interval: Duration::from_secs(1),
        }
    }
}

/// What a capture run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSummary {
    pub frames_captured: u64,
    pub frames_published: u64,
    pub bytes_written: u64,
    pub first_frame: Option<u64>,
    pub last_frame: Option<u64>,
    pub last_published: Option<u64>,
    pub reached_target: bool,
}

/// Releases the camera when the loop exits, whichever way it exits.
struct SessionGuard<'a, C: CameraSession + ?Sized> {
    camera: &'a mut C,
}

impl<C: CameraSession + ?Sized> Drop for SessionGuard<'_, C> {
    fn drop(&mut self) {
        self.camera.close();
    }
}

/// Pulls frames from an open camera until the target is reached or `stop` is set.
///
/// Every frame gets a timestamp record and a file; a frame is published to
/// `buffer` only when `publish_interval` has passed since the previous
/// publication (or since the loop started). The camera is closed before
/// this function returns, including on error.
pub fn run_capture_loop<C: CameraSession + ?Sized>(
    camera: &mut C,
    config: &CaptureLoopConfig,
    buffer: &SharedFrameBuffer,
    stop: &StopSignal,
    writer: &mut FrameWriter,
    log: &mut TimestampLog,
    progress: &CaptureProgress,
) -> Result<CaptureSummary, CaptureError> {
    let mut guard = SessionGuard { camera };
    let mut summary = CaptureSummary::default();
    let mut last_publish = Instant::now();

    tracing::info!(
        target_frames = config.target_frames,
        publish_interval_ms = config.publish_interval.as_millis() as u64,
        "Capture started"
    );

    while !stop.is_stopped() {
        let frame = guard.camera.next_frame()?;
        if frame.pixels().len() != buffer.capacity() {
            return Err(CaptureError::InvalidFrame {
                number: frame.number(),
                got: frame.pixels().len(),
                expected: buffer.capacity(),
            });
        }

        let record = log.append(&frame)?;

        let now = Instant::now();
        if now.duration_since(last_publish) >= config.publish_interval {
            buffer.publish(frame.number(), frame.pixels())?;
            last_publish = now;
            summary.frames_published += 1;
            summary.last_published = Some(frame.number());
            progress.record_publish();
        }

        writer.write(&frame)?;

        let bytes = frame.pixels().len() as u64;
        summary.frames_captured += 1;
        summary.bytes_written += bytes;
        summary.first_frame.get_or_insert(frame.number());
        summary.last_frame = Some(frame.number());
        progress.record_capture(bytes, record.since_previous_secs);

        if summary.frames_captured == config.target_frames {
            summary.reached_target = true;
            stop.request_stop();
        }
    }

    log.flush()?;
    drop(guard);

    tracing::info!(
        captured = summary.frames_captured,
        published = summary.frames_published,
        reached_target = summary.reached_target,
        "Capture finished"
    );
    Ok(summary)
}
