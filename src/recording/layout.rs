//! Output naming for one capture run.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths of the frames directory and metadata file for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingLayout {
    pub frames_dir: PathBuf,
    pub metadata_file: PathBuf,
}

impl RecordingLayout {
    /// Layout stamped with the current local time.
    pub fn now(root: impl AsRef<Path>) -> Self {
        Self::at(root, Local::now())
    }

    /// Layout stamped with `when`: `Frames_<stamp>/` and `frames_meta_<stamp>.txt`.
    pub fn at(root: impl AsRef<Path>, when: DateTime<Local>) -> Self {
        let stamp = when.format(STAMP_FORMAT).to_string();
        let root = root.as_ref();
        Self {
            frames_dir: root.join(format!("Frames_{stamp}")),
            metadata_file: root.join(format!("frames_meta_{stamp}.txt")),
        }
    }
}
