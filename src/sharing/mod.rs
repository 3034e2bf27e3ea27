//! State shared between the capture and display workers.
//!
//! The preview handoff holds exactly one frame: the capture side
//! overwrites it, the display side copies it out. Nothing is queued.

mod buffer;
mod stop;

pub use buffer::{SharedFrameBuffer, SharingError};
pub use stop::{StopOnDrop, StopSignal};
