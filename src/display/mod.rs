//! Live preview of the most recently published frame.
//!
//! The preview is for a human watching the experiment; it runs far
//! slower than capture and never affects what is written to disk.

mod headless;
mod keyboard;
mod snapshot;

pub use headless::HeadlessDisplay;
pub use keyboard::QuitKey;
pub use snapshot::SnapshotDisplay;

use thiserror::Error;

/// Errors that can occur in a preview display.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to initialise display: {0}")]
    InitFailed(String),
    #[error("failed to render frame {number}: {reason}")]
    RenderFailed { number: u64, reason: String },
    #[error("preview frame has {got} bytes, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },
    #[error("display worker panicked")]
    WorkerPanicked,
}

/// A copy of the shared buffer ready to be rendered.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub number: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A preview surface.
///
/// `poll_quit` is called once per display pass whether or not a new frame
/// was presented; it services the surface's event handling and may wait
/// up to the refresh interval.
pub trait Display {
    /// Renders a frame.
    fn present(&mut self, image: &PreviewImage) -> Result<(), DisplayError>;

    /// Returns true when the user asked to stop.
    fn poll_quit(&mut self) -> Result<bool, DisplayError>;

    /// Releases the surface. Called exactly once when the display loop exits.
    fn teardown(&mut self);
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn present(&mut self, image: &PreviewImage) -> Result<(), DisplayError> {
        (**self).present(image)
    }

    fn poll_quit(&mut self) -> Result<bool, DisplayError> {
        (**self).poll_quit()
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}
