//! Prometheus metrics for capture monitoring.
//!
//! # Metrics Exposed
//!
//! - `lab_capture_frames_captured_total` - Frames pulled from the camera
//! - `lab_capture_frames_published_total` - Frames copied into the preview buffer
//! - `lab_capture_frames_displayed_total` - Frames rendered by the preview
//! - `lab_capture_bytes_written_total` - Raw frame bytes persisted
//! - `lab_capture_frame_interval_seconds` - Device time between the last two frames
//!
//! # Example
//!
//! ```no_run
//! use lab_capture::metrics::{CaptureProgress, MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let progress = CaptureProgress::new();
//!
//! registry.update(&MetricsSnapshot::from_progress(&progress));
//! ```

mod collector;
mod progress;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
pub use progress::CaptureProgress;
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
