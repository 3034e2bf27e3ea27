//! Single-slot frame buffer with a separately locked sequence counter.
//!
//! Pixels and the frame number live behind two independent mutexes, so
//! the capture thread never holds both at once. A reader may briefly see
//! a counter that is one publication ahead of or behind the pixels; the
//! counter is only a change signal, never an index into the pixels.

use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors raised by the shared buffer.
#[derive(Debug, Error)]
pub enum SharingError {
    #[error("frame has {got} bytes, buffer holds {expected}")]
    SizeMismatch { got: usize, expected: usize },
    #[error("frame {number} published after frame {latest}")]
    OutOfOrder { number: u64, latest: u64 },
}

/// Latest-frame handoff between one writer and one reader.
#[derive(Debug)]
pub struct SharedFrameBuffer {
    pixels: Mutex<Vec<u8>>,
    sequence: Mutex<Option<u64>>,
    capacity: usize,
}

impl SharedFrameBuffer {
    /// Creates a zero-filled buffer of `capacity` bytes with no frame published.
    pub fn new(capacity: usize) -> Self {
        Self {
            pixels: Mutex::new(vec![0u8; capacity]),
            sequence: Mutex::new(None),
            capacity,
        }
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Overwrites the buffer with `pixels`, then advertises `number`.
    pub fn publish(&self, number: u64, pixels: &[u8]) -> Result<(), SharingError> {
        if pixels.len() != self.capacity {
            return Err(SharingError::SizeMismatch {
                got: pixels.len(),
                expected: self.capacity,
            });
        }
        if let Some(latest) = self.latest_number() {
            if number < latest {
                return Err(SharingError::OutOfOrder { number, latest });
            }
        }

        lock(&self.pixels).copy_from_slice(pixels);
        *lock(&self.sequence) = Some(number);

        tracing::trace!(number, "Published preview frame");
        Ok(())
    }

    /// Last published frame number, or `None` before the first publication.
    pub fn latest_number(&self) -> Option<u64> {
        *lock(&self.sequence)
    }

    /// Copies the current buffer contents out.
    pub fn snapshot(&self) -> Vec<u8> {
        lock(&self.pixels).clone()
    }

    /// Copies the current buffer contents into `dest`, which must be `capacity` bytes.
    pub fn copy_into(&self, dest: &mut [u8]) -> Result<(), SharingError> {
        if dest.len() != self.capacity {
            return Err(SharingError::SizeMismatch {
                got: dest.len(),
                expected: self.capacity,
            });
        }
        dest.copy_from_slice(&lock(&self.pixels));
        Ok(())
    }
}

// Holders only copy bytes while locked, so a poisoned lock still guards
// a complete frame.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
