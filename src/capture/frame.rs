//! Frame type representing one sensor image with device metadata.

/// A single captured frame from the camera.
///
/// Frames are immutable once produced by a [`CameraSession`](super::CameraSession).
/// The frame number and timestamp come from the device: numbers increase
/// monotonically but are not guaranteed to be contiguous, and timestamps are
/// expressed in device milliseconds.
#[derive(Clone)]
pub struct Frame {
    /// Raw row-major pixel data, one byte per sample for 8-bit formats.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Device-assigned frame number.
    number: u64,
    /// Device timestamp in milliseconds.
    timestamp_ms: f64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, number: u64, timestamp_ms: f64) -> Self {
        Self {
            pixels,
            width,
            height,
            number,
            timestamp_ms,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the frame and returns its pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the device frame number.
    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the device timestamp in milliseconds.
    #[inline]
    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("number", &self.number)
            .field("timestamp_ms", &self.timestamp_ms)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 848 * 480];
        let frame = Frame::new(pixels, 848, 480, 7, 1234.5);

        assert_eq!(frame.width(), 848);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.number(), 7);
        assert_eq!(frame.timestamp_ms(), 1234.5);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 100]; // Wrong size
        let frame = Frame::new(pixels, 848, 480, 1, 0.0);

        assert!(!frame.is_valid());
    }

    #[test]
    fn test_debug_omits_pixels() {
        let frame = Frame::new(vec![9u8; 16], 4, 4, 3, 0.0);
        let text = format!("{:?}", frame);
        assert!(text.contains("pixel_bytes: 16"));
        assert!(!text.contains("[9"));
    }
}
