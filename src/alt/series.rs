//! Per-slice sSAD accumulation.

use super::AltError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File name of the sSAD listing inside a slice directory.
pub const SADS_FILE: &str = "SADs.txt";

/// sSAD values of one time slice, in frame order.
#[derive(Debug, Clone, Default)]
pub struct SadSeries {
    values: Vec<u64>,
    fill_key_frames: bool,
}

impl SadSeries {
    pub fn new(fill_key_frames: bool) -> Self {
        Self {
            values: Vec::new(),
            fill_key_frames,
        }
    }

    /// Appends one frame's sSAD.
    ///
    /// With key-frame filling, a zero is replaced by the previous value.
    /// A zero at the very start has nothing to copy and is kept.
    pub fn push(&mut self, ssad: u64) {
        let value = match (self.fill_key_frames, ssad, self.values.last()) {
            (true, 0, Some(&previous)) => previous,
            _ => ssad,
        };
        self.values.push(value);
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes `<1-based index>: <sSAD>` lines.
    pub fn write_to(&self, path: &Path) -> Result<(), AltError> {
        let io_err = |source| AltError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
        for (i, value) in self.values.iter().enumerate() {
            writeln!(out, "{}: {}", i + 1, value).map_err(io_err)?;
        }
        out.flush().map_err(io_err)
    }
}
