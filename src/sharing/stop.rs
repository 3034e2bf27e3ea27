//! Cooperative shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A latch observed by every worker once per iteration.
///
/// Once stopped it stays stopped. Clones share the same latch.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Returns true if this call flipped the latch.
    pub fn request_stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            tracing::debug!("Stop requested");
        }
        first
    }

    /// Returns true once any holder has requested shutdown.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Requests shutdown when the returned guard is dropped, including
    /// during a panic unwind.
    pub fn stop_on_drop(&self) -> StopOnDrop<'_> {
        StopOnDrop(self)
    }
}

/// See [`StopSignal::stop_on_drop`].
#[must_use = "the stop is requested when the guard is dropped"]
pub struct StopOnDrop<'a>(&'a StopSignal);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.request_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_running() {
        assert!(!StopSignal::new().is_stopped());
    }

    #[test]
    fn test_latch_is_shared_and_permanent() {
        let signal = StopSignal::new();
        let other = signal.clone();

        assert!(other.request_stop());
        assert!(signal.is_stopped());

        assert!(!signal.request_stop());
        assert!(other.is_stopped());
    }

    #[test]
    fn test_stop_on_drop() {
        let signal = StopSignal::new();
        {
            let _guard = signal.stop_on_drop();
            assert!(!signal.is_stopped());
        }
        assert!(signal.is_stopped());
    }

    #[test]
    fn test_visible_across_threads() {
        let signal = StopSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || {
            remote.request_stop();
        })
        .join()
        .unwrap();
        assert!(signal.is_stopped());
    }
}
