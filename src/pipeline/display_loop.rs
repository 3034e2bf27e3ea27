//! Preview worker.

use crate::display::{Display, DisplayError, PreviewImage};
use crate::metrics::CaptureProgress;
use crate::sharing::{SharedFrameBuffer, StopSignal};

/// What a display run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySummary {
    pub frames_presented: u64,
    pub last_presented: Option<u64>,
    pub quit_requested: bool,
}

struct TeardownGuard<'a, D: Display + ?Sized> {
    display: &'a mut D,
}

impl<D: Display + ?Sized> Drop for TeardownGuard<'_, D> {
    fn drop(&mut self) {
        self.display.teardown();
    }
}

/// Renders each newly published frame until `stop` is set or the user quits.
///
/// A frame is copied out of `buffer` only when the published number differs
/// from the last one rendered. A quit request sets `stop` for every worker.
/// The display is torn down on every exit path.
pub fn run_display_loop<D: Display + ?Sized>(
    display: &mut D,
    buffer: &SharedFrameBuffer,
    stop: &StopSignal,
    width: u32,
    height: u32,
    progress: &CaptureProgress,
) -> Result<DisplaySummary, DisplayError> {
    let mut guard = TeardownGuard { display };
    let mut summary = DisplaySummary::default();
    let mut last_rendered: Option<u64> = None;

    while !stop.is_stopped() {
        let current = buffer.latest_number();
        if let Some(number) = current.filter(|_| current != last_rendered) {
            let pixels = buffer.snapshot();
            last_rendered = current;

            guard.display.present(&PreviewImage {
                number,
                width,
                height,
                pixels,
            })?;
            summary.frames_presented += 1;
            summary.last_presented = Some(number);
            progress.record_display();
        }

        if guard.display.poll_quit()? {
            tracing::info!("Quit requested from preview");
            summary.quit_requested = true;
            stop.request_stop();
        }
    }

    drop(guard);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what it was shown; quits after a fixed number of passes.
    #[derive(Default)]
    struct RecordingDisplay {
        shown: Vec<u64>,
        passes: u32,
        quit_after: Option<u32>,
        teardowns: u32,
        fail_present: bool,
    }

    impl Display for RecordingDisplay {
        fn present(&mut self, image: &PreviewImage) -> Result<(), DisplayError> {
            if self.fail_present {
                return Err(DisplayError::RenderFailed {
                    number: image.number,
                    reason: "broken".into(),
                });
            }
            self.shown.push(image.number);
            Ok(())
        }

        fn poll_quit(&mut self) -> Result<bool, DisplayError> {
            self.passes += 1;
            Ok(self.quit_after.is_some_and(|n| self.passes >= n))
        }

        fn teardown(&mut self) {
            self.teardowns += 1;
        }
    }

    #[test]
    fn test_quit_sets_stop_and_tears_down() {
        let buffer = SharedFrameBuffer::new(4);
        buffer.publish(7, &[1, 2, 3, 4]).unwrap();
        let stop = StopSignal::new();
        let mut display = RecordingDisplay {
            quit_after: Some(3),
            ..Default::default()
        };

        let summary =
            run_display_loop(&mut display, &buffer, &stop, 2, 2, &CaptureProgress::new())
                .unwrap();

        assert!(stop.is_stopped());
        assert!(summary.quit_requested);
        // The same frame is rendered once no matter how many passes run.
        assert_eq!(display.shown, vec![7]);
        assert_eq!(display.passes, 3);
        assert_eq!(display.teardowns, 1);
    }

    #[test]
    fn test_nothing_rendered_before_first_publish() {
        let buffer = SharedFrameBuffer::new(4);
        let stop = StopSignal::new();
        let mut display = RecordingDisplay {
            quit_after: Some(5),
            ..Default::default()
        };

        let summary =
            run_display_loop(&mut display, &buffer, &stop, 2, 2, &CaptureProgress::new())
                .unwrap();

        assert_eq!(summary.frames_presented, 0);
        assert!(display.shown.is_empty());
    }

    #[test]
    fn test_exits_when_stopped_elsewhere() {
        let buffer = SharedFrameBuffer::new(4);
        let stop = StopSignal::new();
        stop.request_stop();
        let mut display = RecordingDisplay::default();

        let summary =
            run_display_loop(&mut display, &buffer, &stop, 2, 2, &CaptureProgress::new())
                .unwrap();

        assert!(!summary.quit_requested);
        assert_eq!(display.passes, 0);
        assert_eq!(display.teardowns, 1);
    }

    #[test]
    fn test_render_failure_tears_down() {
        let buffer = SharedFrameBuffer::new(4);
        buffer.publish(1, &[0; 4]).unwrap();
        let stop = StopSignal::new();
        let mut display = RecordingDisplay {
            fail_present: true,
            ..Default::default()
        };

        let result =
            run_display_loop(&mut display, &buffer, &stop, 2, 2, &CaptureProgress::new());

        assert!(matches!(result, Err(DisplayError::RenderFailed { number: 1, .. })));
        assert_eq!(display.teardowns, 1);
        // Display failures are not a stop request.
        assert!(!stop.is_stopped());
    }
}
