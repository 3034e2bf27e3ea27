//! The capture and display workers and the session that runs them.
//!
//! ```text
//! camera ─► capture loop ─┬─► per-frame files + timestamp log (every frame)
//!                         └─► shared buffer (throttled) ─► display loop ─► preview
//! ```
//!
//! Both loops poll the same [`StopSignal`](crate::sharing::StopSignal):
//! capture sets it when the target frame count is reached, display sets
//! it when the user quits, and the Ctrl-C handler may set it at any time.

mod capture_loop;
mod display_loop;
mod session;

pub use capture_loop::{run_capture_loop, CaptureError, CaptureLoopConfig, CaptureSummary};
pub use display_loop::{run_display_loop, DisplaySummary};
pub use session::{CaptureSession, SessionReport};
