//! Preview written to a PNG file.
//!
//! Any image viewer that reloads on change can watch the file. Each frame
//! is written to a temporary sibling and renamed over the preview, so a
//! viewer never reads a half-written image.

use super::{Display, DisplayError, PreviewImage, QuitKey};
use image::{GrayImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Grayscale PNG preview.
#[derive(Debug)]
pub struct SnapshotDisplay {
    path: PathBuf,
    staging: PathBuf,
    refresh: Duration,
    quit: QuitKey,
    presented: u64,
}

impl SnapshotDisplay {
    /// Prepares the preview target. Fails if its directory does not exist.
    pub fn open(
        path: impl Into<PathBuf>,
        refresh: Duration,
        quit: QuitKey,
    ) -> Result<Self, DisplayError> {
        let path = path.into();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(DisplayError::InitFailed(format!(
                "preview directory {} does not exist",
                parent.display()
            )));
        }

        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");

        tracing::info!(path = %path.display(), "Preview file ready");
        Ok(Self {
            path,
            staging: PathBuf::from(staging),
            refresh,
            quit,
            presented: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Display for SnapshotDisplay {
    fn present(&mut self, image: &PreviewImage) -> Result<(), DisplayError> {
        let expected = (image.width as usize) * (image.height as usize);
        let gray = GrayImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or(
            DisplayError::SizeMismatch {
                got: image.pixels.len(),
                expected,
            },
        )?;

        let render_err = |reason: String| DisplayError::RenderFailed {
            number: image.number,
            reason,
        };
        gray.save_with_format(&self.staging, ImageFormat::Png)
            .map_err(|e| render_err(e.to_string()))?;
        std::fs::rename(&self.staging, &self.path).map_err(|e| render_err(e.to_string()))?;

        self.presented += 1;
        tracing::debug!(frame = image.number, "Preview updated");
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool, DisplayError> {
        if !self.refresh.is_zero() {
            std::thread::sleep(self.refresh);
        }
        Ok(self.quit.is_pressed())
    }

    fn teardown(&mut self) {
        // The last preview stays on disk; only the staging file goes.
        let _ = std::fs::remove_file(&self.staging);
        tracing::info!(presented = self.presented, "Preview file closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_requires_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope").join("preview.png");
        assert!(matches!(
            SnapshotDisplay::open(missing, Duration::ZERO, QuitKey::manual()),
            Err(DisplayError::InitFailed(_))
        ));
    }

    #[test]
    fn test_present_writes_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("preview.png");
        let mut display =
            SnapshotDisplay::open(&path, Duration::ZERO, QuitKey::manual()).unwrap();

        let image = PreviewImage {
            number: 3,
            width: 4,
            height: 2,
            pixels: (0..8).collect(),
        };
        display.present(&image).unwrap();
        display.teardown();

        let decoded = image::open(&path).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.into_raw(), (0..8).collect::<Vec<u8>>());
        assert_eq!(display.presented(), 1);
    }

    #[test]
    fn test_present_rejects_wrong_size() {
        let tmp = tempfile::tempdir().unwrap();
        let mut display = SnapshotDisplay::open(
            tmp.path().join("preview.png"),
            Duration::ZERO,
            QuitKey::manual(),
        )
        .unwrap();

        let image = PreviewImage {
            number: 1,
            width: 4,
            height: 4,
            pixels: vec![0; 3],
        };
        assert!(matches!(
            display.present(&image),
            Err(DisplayError::SizeMismatch { got: 3, expected: 16 })
        ));
    }

    #[test]
    fn test_quit_key() {
        let tmp = tempfile::tempdir().unwrap();
        let quit = QuitKey::manual();
        let mut display =
            SnapshotDisplay::open(tmp.path().join("p.png"), Duration::ZERO, quit.clone())
                .unwrap();

        assert!(!display.poll_quit().unwrap());
        quit.press();
        assert!(display.poll_quit().unwrap());
    }
}
