//! Live counters shared by the capture and display workers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals for one session, readable from any thread.
#[derive(Debug, Default)]
pub struct CaptureProgress {
    frames_captured: AtomicU64,
    frames_published: AtomicU64,
    frames_displayed: AtomicU64,
    bytes_written: AtomicU64,
    // Stored as f64 bits.
    last_frame_interval: AtomicU64,
}

impl CaptureProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_capture(&self, bytes: u64, interval_secs: f64) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        if interval_secs.is_finite() {
            self.last_frame_interval
                .store(interval_secs.to_bits(), Ordering::Relaxed);
        }
    }

    pub(crate) fn record_publish(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_display(&self) {
        self.frames_displayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured.load(Ordering::Relaxed)
    }

    pub fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Relaxed)
    }

    pub fn frames_displayed(&self) -> u64 {
        self.frames_displayed.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Device time between the two most recent frames, in seconds.
    pub fn last_frame_interval_secs(&self) -> f64 {
        f64::from_bits(self.last_frame_interval.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let progress = CaptureProgress::new();
        progress.record_capture(100, f64::NAN);
        progress.record_capture(100, 0.016);
        progress.record_publish();
        progress.record_display();

        assert_eq!(progress.frames_captured(), 2);
        assert_eq!(progress.bytes_written(), 200);
        assert_eq!(progress.frames_published(), 1);
        assert_eq!(progress.frames_displayed(), 1);
        assert_eq!(progress.last_frame_interval_secs(), 0.016);
    }
}
