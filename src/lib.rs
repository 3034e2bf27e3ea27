//! Laboratory Frame Capture Library
//!
//! Two data-acquisition tools for behavioural experiments:
//!
//! - **Infrared capture with live preview.** Every frame from a stereo
//!   depth camera's infrared imager is written to disk with a timestamp
//!   record, while a throttled copy of the newest frame is handed to a
//!   preview worker through a single-slot shared buffer.
//! - **Activity Level Tracking (ALT).** A low-light camera records video
//!   in time slices and logs the encoder's per-frame motion sum (sSAD).
//!
//! # Architecture
//!
//! ```text
//! CameraSession ─► capture loop ─┬─► recording (frames dir + metadata file)
//!                                └─► SharedFrameBuffer ─► display loop ─► Display
//!                  StopSignal ◄── Ctrl-C / quit key / frame target
//! ```
//!
//! The camera and display are traits; the library ships simulated
//! implementations so the whole pipeline runs without hardware.
//!
//! # Example
//!
//! ```no_run
//! use lab_capture::{
//!     capture::{CaptureConfig, SimulatedCamera},
//!     display::{HeadlessDisplay, QuitKey},
//!     pipeline::CaptureSession,
//!     recording::RecordingLayout,
//! };
//! use std::time::Duration;
//!
//! let config = CaptureConfig { duration_secs: 2, ..CaptureConfig::default() };
//! let session = CaptureSession::new(
//!     config,
//!     Duration::from_secs(1),
//!     RecordingLayout::now("."),
//! )
//! .unwrap();
//!
//! let report = session
//!     .run(SimulatedCamera::new, || {
//!         Ok(HeadlessDisplay::new(Duration::from_millis(1), QuitKey::manual()))
//!     })
//!     .unwrap();
//! println!("captured {} frames", report.capture.frames_captured);
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod alt;
pub mod capture;
pub mod display;
pub mod metrics;
pub mod pipeline;
pub mod recording;
pub mod sharing;

// Re-export commonly used types at crate root
pub use capture::{CameraSession, CaptureConfig, FileConfig, Frame, SimulatedCamera};
pub use display::{Display, HeadlessDisplay, SnapshotDisplay};
pub use pipeline::{CaptureSession, SessionReport};
pub use sharing::{SharedFrameBuffer, StopSignal};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
