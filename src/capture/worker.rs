//! Frame reads with a deadline.
//!
//! Device SDKs block inside their frame call with no way to give up. The
//! source runs on its own thread and the caller waits on a channel, so a
//! configured frame timeout can end the wait even when the device hangs.

use super::{CameraError, Frame};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A blocking frame producer that lives on the worker thread.
pub(crate) trait BlockingSource {
    fn grab(&mut self) -> Result<Frame, CameraError>;

    /// Stops the stream. Called once, on the worker thread.
    fn stop(&mut self);
}

/// Pulls frames from a [`BlockingSource`] running on a dedicated thread.
pub(crate) struct FrameWorker {
    requests: Option<mpsc::Sender<()>>,
    frames: mpsc::Receiver<Result<Frame, CameraError>>,
    handle: Option<JoinHandle<()>>,
    timeout: Option<Duration>,
    stalled: bool,
}

impl FrameWorker {
    /// Starts the worker and waits until `start` has opened the source.
    ///
    /// `start` runs on the worker thread, so the source need not be `Send`.
    pub(crate) fn spawn<S, F>(
        name: &str,
        timeout: Option<Duration>,
        start: F,
    ) -> Result<Self, CameraError>
    where
        S: BlockingSource + 'static,
        F: FnOnce() -> Result<S, CameraError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CameraError>>();
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (frame_tx, frame_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut source = match start() {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    source.stop();
                    return;
                }
                while request_rx.recv().is_ok() {
                    if frame_tx.send(source.grab()).is_err() {
                        break;
                    }
                }
                source.stop();
            })
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                requests: Some(request_tx),
                frames: frame_rx,
                handle: Some(handle),
                timeout,
                stalled: false,
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CameraError::OpenFailed("device worker exited during start".into()))
            }
        }
    }

    /// Requests one frame and waits for it, up to the timeout if one is set.
    pub(crate) fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let requests = self.requests.as_ref().ok_or(CameraError::NotInitialized)?;
        if let Some(timeout) = self.timeout.filter(|_| self.stalled) {
            return Err(CameraError::Timeout(timeout));
        }
        requests
            .send(())
            .map_err(|_| CameraError::CaptureFailed("device worker exited".into()))?;

        let received = match self.timeout {
            Some(timeout) => self.frames.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    self.stalled = true;
                    CameraError::Timeout(timeout)
                }
                RecvTimeoutError::Disconnected => {
                    CameraError::CaptureFailed("device worker exited".into())
                }
            }),
            None => self
                .frames
                .recv()
                .map_err(|_| CameraError::CaptureFailed("device worker exited".into())),
        };
        received?
    }

    pub(crate) fn is_running(&self) -> bool {
        self.requests.is_some()
    }

    /// Stops the source and joins the worker. A worker stuck in a stalled
    /// read is left to finish on its own.
    pub(crate) fn shutdown(&mut self) {
        if self.requests.take().is_none() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if self.stalled {
                tracing::warn!("Device still blocked in a frame read; detaching its worker");
            } else if handle.join().is_err() {
                tracing::warn!("Device worker panicked");
            }
        }
    }
}

impl Drop for FrameWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
