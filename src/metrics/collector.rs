//! Metrics collection and registry.

use super::CaptureProgress;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub frames_captured: u64,
    pub frames_published: u64,
    pub frames_displayed: u64,
    pub bytes_written: u64,
    /// Device time between the last two frames, if known.
    pub frame_interval_secs: Option<f64>,
}

impl MetricsSnapshot {
    /// Reads the live counters of a session.
    pub fn from_progress(progress: &CaptureProgress) -> Self {
        let interval = progress.last_frame_interval_secs();
        Self {
            frames_captured: progress.frames_captured(),
            frames_published: progress.frames_published(),
            frames_displayed: progress.frames_displayed(),
            bytes_written: progress.bytes_written(),
            frame_interval_secs: (progress.frames_captured() > 1).then_some(interval),
        }
    }
}

/// Prometheus metrics registry for capture monitoring.
pub struct MetricsRegistry {
    registry: Registry,
    frames_captured: IntCounter,
    frames_published: IntCounter,
    frames_displayed: IntCounter,
    bytes_written: IntCounter,
    frame_interval: Gauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_captured = IntCounter::new(
            "lab_capture_frames_captured_total",
            "Frames pulled from the camera",
        )?;
        let frames_published = IntCounter::new(
            "lab_capture_frames_published_total",
            "Frames copied into the preview buffer",
        )?;
        let frames_displayed = IntCounter::new(
            "lab_capture_frames_displayed_total",
            "Frames rendered by the preview",
        )?;
        let bytes_written = IntCounter::new(
            "lab_capture_bytes_written_total",
            "Raw frame bytes persisted to disk",
        )?;
        let frame_interval = Gauge::new(
            "lab_capture_frame_interval_seconds",
            "Device time between the two most recent frames",
        )?;

        registry.register(Box::new(frames_captured.clone()))?;
        registry.register(Box::new(frames_published.clone()))?;
        registry.register(Box::new(frames_displayed.clone()))?;
        registry.register(Box::new(bytes_written.clone()))?;
        registry.register(Box::new(frame_interval.clone()))?;

        Ok(Self {
            registry,
            frames_captured,
            frames_published,
            frames_displayed,
            bytes_written,
            frame_interval,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward, so increment by the difference
        advance(&self.frames_captured, snapshot.frames_captured);
        advance(&self.frames_published, snapshot.frames_published);
        advance(&self.frames_displayed, snapshot.frames_displayed);
        advance(&self.bytes_written, snapshot.bytes_written);

        if let Some(interval) = snapshot.frame_interval_secs {
            self.frame_interval.set(interval);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}
