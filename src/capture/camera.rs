//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and simulated implementations for testing.

use super::{CaptureConfig, Frame};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("no frame arrived within {0:?}")]
    Timeout(Duration),
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and simulated implementations for testing. Device handles are often
/// thread-bound, so sessions are constructed on the capture thread and
/// never cross threads.
pub trait CameraSession {
    /// Opens the device and starts streaming with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Blocks until the next frame is available.
    fn next_frame(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the camera is currently streaming.
    fn is_open(&self) -> bool;

    /// Stops streaming and releases the device. Calling it on a closed
    /// camera does nothing.
    fn close(&mut self);
}

impl<C: CameraSession + ?Sized> CameraSession for Box<C> {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        (**self).open(config)
    }

    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        (**self).next_frame()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Counts how many times a [`SimulatedCamera`] actually released its device.
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Arc<AtomicUsize>);

impl CloseCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Simulated camera that generates deterministic frames.
///
/// Frame contents are a function of the frame number (see
/// [`SimulatedCamera::pattern`]), so tests can check which frame ended up
/// in the preview buffer.
#[derive(Debug)]
pub struct SimulatedCamera {
    config: Option<CaptureConfig>,
    produced: u64,
    first_number: u64,
    stride: u64,
    paced: bool,
    fail_after: Option<u64>,
    stall_after: Option<u64>,
    last_emit: Option<Instant>,
    closes: CloseCounter,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            config: None,
            produced: 0,
            first_number: 1,
            stride: 1,
            paced: false,
            fail_after: None,
            stall_after: None,
            last_emit: None,
            closes: CloseCounter::default(),
        }
    }

    /// Sleeps between frames so the camera runs at its configured rate.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    /// Starts numbering at `first` and advances by `stride` per frame.
    pub fn with_numbering(mut self, first: u64, stride: u64) -> Self {
        self.first_number = first;
        self.stride = stride.max(1);
        self
    }

    /// Fails every frame request after `frames` frames were produced.
    pub fn failing_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Stops producing frames after `frames` frames, as a hung device would.
    pub fn stalling_after(mut self, frames: u64) -> Self {
        self.stall_after = Some(frames);
        self
    }

    /// Handle for observing device releases.
    pub fn close_counter(&self) -> CloseCounter {
        self.closes.clone()
    }

    /// Device number of the `index`-th produced frame (zero-based).
    pub fn frame_number(&self, index: u64) -> u64 {
        self.first_number + index * self.stride
    }

    /// Pixel pattern for a frame number.
    pub fn pattern(number: u64, width: u32, height: u32) -> Vec<u8> {
        let pixel_count = (width as usize) * (height as usize);
        (0..pixel_count)
            .map(|i| ((i as u64).wrapping_add(number.wrapping_mul(31)) % 251) as u8)
            .collect()
    }

    fn frame_period(config: &CaptureConfig) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(config.fps.max(1)))
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSession for SimulatedCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.produced = 0;
        self.last_emit = None;
        tracing::info!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            depth = config.depth.enabled,
            laser_power = ?config.depth.laser_power,
            "SimulatedCamera opened"
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        if self.fail_after.is_some_and(|n| self.produced >= n) {
            return Err(CameraError::CaptureFailed(
                "simulated device disconnect".to_string(),
            ));
        }

        if self.stall_after.is_some_and(|n| self.produced >= n) {
            return match config.frame_timeout() {
                Some(timeout) => {
                    std::thread::sleep(timeout);
                    Err(CameraError::Timeout(timeout))
                }
                // A stalled device without a timeout would block forever.
                None => Err(CameraError::CaptureFailed(
                    "simulated stall with no frame timeout".to_string(),
                )),
            };
        }

        let period = Self::frame_period(config);
        if self.paced {
            if let Some(last) = self.last_emit {
                let elapsed = last.elapsed();
                if elapsed < period {
                    std::thread::sleep(period - elapsed);
                }
            }
            self.last_emit = Some(Instant::now());
        }

        let number = self.frame_number(self.produced);
        let timestamp_ms = self.produced as f64 * period.as_secs_f64() * 1000.0;
        let pixels = Self::pattern(number, config.width, config.height);
        self.produced += 1;

        Ok(Frame::new(
            pixels,
            config.width,
            config.height,
            number,
            timestamp_ms,
        ))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            self.closes.increment();
            tracing::info!(frames = self.produced, "SimulatedCamera closed");
        }
    }
}
