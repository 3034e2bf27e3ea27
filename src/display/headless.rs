//! Display that only logs.

use super::{Display, DisplayError, PreviewImage, QuitKey};
use std::time::Duration;

/// Logs each presented frame instead of drawing it.
#[derive(Debug)]
pub struct HeadlessDisplay {
    refresh: Duration,
    quit: QuitKey,
    presented: u64,
}

impl HeadlessDisplay {
    pub fn new(refresh: Duration, quit: QuitKey) -> Self {
        Self {
            refresh,
            quit,
            presented: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, image: &PreviewImage) -> Result<(), DisplayError> {
        let mean = if image.pixels.is_empty() {
            0.0
        } else {
            image.pixels.iter().map(|&p| u64::from(p)).sum::<u64>() as f64
                / image.pixels.len() as f64
        };
        self.presented += 1;
        tracing::info!(frame = image.number, mean_intensity = mean, "Preview");
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool, DisplayError> {
        if !self.refresh.is_zero() {
            std::thread::sleep(self.refresh);
        }
        Ok(self.quit.is_pressed())
    }

    fn teardown(&mut self) {
        tracing::debug!(presented = self.presented, "Headless display closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_presented_frames() {
        let quit = QuitKey::manual();
        let mut display = HeadlessDisplay::new(Duration::ZERO, quit.clone());
        let image = PreviewImage {
            number: 1,
            width: 2,
            height: 1,
            pixels: vec![10, 20],
        };

        display.present(&image).unwrap();
        assert_eq!(display.presented(), 1);
        assert!(!display.poll_quit().unwrap());

        quit.press();
        assert!(display.poll_quit().unwrap());
    }
}
