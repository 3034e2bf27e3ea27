//! Hardware camera backed by `nokhwa`.
//!
//! The generic UVC path exposes no device frame counter or sensor clock,
//! so frame numbers are assigned locally and timestamps are taken from a
//! monotonic clock started when the stream opens. The device lives on a
//! worker thread so `frame_timeout_ms` can bound each read.

use super::worker::{BlockingSource, FrameWorker};
use super::{CameraError, CameraSession, CaptureConfig, Frame};
use nokhwa::pixel_format::LumaFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::time::Instant;

/// A physical camera streaming 8-bit luminance frames.
#[derive(Default)]
pub struct DeviceCamera {
    worker: Option<FrameWorker>,
}

impl DeviceCamera {
    pub fn new() -> Self {
        Self::default()
    }
}

struct NokhwaSource {
    camera: Camera,
    width: u32,
    height: u32,
    next_number: u64,
    started: Instant,
}

impl NokhwaSource {
    fn open(config: &CaptureConfig) -> Result<Self, CameraError> {
        let requested = RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::GRAY,
                config.fps,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(config.device_id), requested)
            .map_err(|e| CameraError::DeviceNotFound(e.to_string()))?;

        let resolution = camera.resolution();
        if resolution.width() != config.width || resolution.height() != config.height {
            return Err(CameraError::ConfigFailed(format!(
                "device offers {}x{}, requested {}x{}",
                resolution.width(),
                resolution.height(),
                config.width,
                config.height
            )));
        }

        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        Ok(Self {
            camera,
            width: config.width,
            height: config.height,
            next_number: 1,
            started: Instant::now(),
        })
    }
}

impl BlockingSource for NokhwaSource {
    fn grab(&mut self) -> Result<Frame, CameraError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let timestamp_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let image = buffer
            .decode_image::<LumaFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let number = self.next_number;
        self.next_number += 1;

        Ok(Frame::new(
            image.into_raw(),
            self.width,
            self.height,
            number,
            timestamp_ms,
        ))
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(error = %e, "Failed to stop camera stream");
        }
        tracing::info!(frames = self.next_number - 1, "Camera closed");
    }
}

impl CameraSession for DeviceCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        if config.depth.enabled {
            tracing::warn!("depth stream and emitter settings are not available on this backend");
        }

        let settings = config.clone();
        let worker = FrameWorker::spawn("camera-device", config.frame_timeout(), move || {
            NokhwaSource::open(&settings)
        })?;

        tracing::info!(
            device = config.device_id,
            width = config.width,
            height = config.height,
            fps = config.fps,
            timeout_ms = ?config.frame_timeout_ms,
            "Camera stream started"
        );
        self.worker = Some(worker);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        self.worker
            .as_mut()
            .ok_or(CameraError::NotInitialized)?
            .next_frame()
    }

    fn is_open(&self) -> bool {
        self.worker.as_ref().is_some_and(FrameWorker::is_running)
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}
