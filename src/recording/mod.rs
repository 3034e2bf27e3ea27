//! Persistence of every captured frame.
//!
//! Each run produces a frames directory holding one raw file per frame
//! and a sibling metadata file with one timestamp record per frame.
//! Both are written in capture order and are independent of preview
//! throttling.

mod layout;
mod timestamps;
mod writer;

pub use layout::RecordingLayout;
pub use timestamps::{TimestampLog, TimestampRecord, TimestampTracker};
pub use writer::{frame_file_name, FrameWriter};

use thiserror::Error;

/// Errors that can occur while persisting frames.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
