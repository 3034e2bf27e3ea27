//! One raw file per captured frame.

use super::RecordError;
use crate::capture::Frame;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension of per-frame files.
pub const FRAME_EXTENSION: &str = "dat";

/// File name for a frame number: nine zero-padded digits plus extension.
pub fn frame_file_name(number: u64) -> String {
    format!("{number:09}.{FRAME_EXTENSION}")
}

/// Writes raw frame bytes into a frames directory.
///
/// Files are created with `create_new`, so a repeated frame number is an
/// error rather than a silent overwrite.
#[derive(Debug)]
pub struct FrameWriter {
    dir: PathBuf,
    files_written: u64,
    bytes_written: u64,
}

impl FrameWriter {
    /// Creates the directory (and parents) if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| RecordError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        tracing::info!(dir = %dir.display(), "Writing frames");
        Ok(Self {
            dir,
            files_written: 0,
            bytes_written: 0,
        })
    }

    /// Persists `frame` and returns the path written.
    pub fn write(&mut self, frame: &Frame) -> Result<PathBuf, RecordError> {
        let path = self.dir.join(frame_file_name(frame.number()));
        let write_err = |source| RecordError::Write {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(write_err)?;
        file.write_all(frame.pixels()).map_err(write_err)?;

        self.files_written += 1;
        self.bytes_written += frame.pixels().len() as u64;
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files_written(&self) -> u64 {
        self.files_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
