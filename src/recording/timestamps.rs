//! Per-frame timestamp records.
//!
//! Device timestamps are in milliseconds; the two deltas are written in
//! seconds. The first record has no predecessor and carries `NaN`.

use super::RecordError;
use crate::capture::Frame;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One metadata line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampRecord {
    pub frame_number: u64,
    pub timestamp_ms: f64,
    pub since_first_secs: f64,
    /// `NaN` for the first frame of a run.
    pub since_previous_secs: f64,
}

impl fmt::Display for TimestampRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.frame_number, self.timestamp_ms, self.since_first_secs, self.since_previous_secs
        )
    }
}

/// Derives records from successive device timestamps.
#[derive(Debug, Default, Clone)]
pub struct TimestampTracker {
    first_ms: Option<f64>,
    previous_ms: Option<f64>,
}

impl TimestampTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the record for the next frame in capture order.
    pub fn observe(&mut self, frame_number: u64, timestamp_ms: f64) -> TimestampRecord {
        let first = *self.first_ms.get_or_insert(timestamp_ms);
        let since_previous_secs = self
            .previous_ms
            .map_or(f64::NAN, |prev| (timestamp_ms - prev) / 1000.0);
        self.previous_ms = Some(timestamp_ms);

        TimestampRecord {
            frame_number,
            timestamp_ms,
            since_first_secs: (timestamp_ms - first) / 1000.0,
            since_previous_secs,
        }
    }
}

/// Buffered metadata file writer.
pub struct TimestampLog {
    path: PathBuf,
    out: BufWriter<File>,
    tracker: TimestampTracker,
    lines: u64,
}

impl TimestampLog {
    /// Creates the metadata file. An existing file is never truncated.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let path = path.into();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| RecordError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            tracker: TimestampTracker::new(),
            lines: 0,
        })
    }

    /// Appends the record for `frame`.
    pub fn append(&mut self, frame: &Frame) -> Result<TimestampRecord, RecordError> {
        let record = self.tracker.observe(frame.number(), frame.timestamp_ms());
        writeln!(self.out, "{record}").map_err(|source| RecordError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.lines += 1;
        Ok(record)
    }

    /// Flushes buffered records to disk.
    pub fn flush(&mut self) -> Result<(), RecordError> {
        self.out.flush().map_err(|source| RecordError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }
}

impl Drop for TimestampLog {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush timestamp log");
        }
    }
}
