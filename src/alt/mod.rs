//! Activity Level Tracking (ALT) motion logger.
//!
//! A low-light camera records video in fixed-length time slices. The
//! encoder's motion estimation produces one block-SAD field per frame;
//! the sum over each field (sSAD) is a cheap measure of how much the
//! scene moved. Each slice gets its own directory with the video and a
//! `SADs.txt` listing one sSAD per frame.

mod config;
mod logger;
mod motion;
mod series;

pub use config::AltConfig;
pub use logger::{AltLogger, AltSummary, SliceSummary};
pub use motion::{MotionCamera, MotionField, MotionVector, SimulatedMotionCamera};
pub use series::SadSeries;

use crate::capture::{CameraError, ConfigError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an ALT experiment.
#[derive(Debug, Error)]
pub enum AltError {
    #[error("experiment directory {0} already exists; refusing to overwrite earlier data")]
    OutputExists(PathBuf),
    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
