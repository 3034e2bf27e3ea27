//! Camera capture configuration.
//!
//! The infrared stream is what gets recorded and previewed. The depth
//! stream is enabled alongside it because the emitter settings (laser
//! power, auto-exposure) only apply while depth is streaming.

use crate::alt::AltConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest frame rate accepted by [`CaptureConfig::validate`].
pub const MAX_FPS: u32 = 300;

/// Sensor pixel formats understood by the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 8-bit luminance (infrared).
    Y8,
    /// 16-bit depth.
    Z16,
}

impl PixelFormat {
    /// Bytes used by one sample of this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Y8 => 1,
            PixelFormat::Z16 => 2,
        }
    }
}

/// Emitter power for the depth projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaserPower {
    /// Use the maximum of the device's supported range.
    Max,
    /// Use an explicit device-specific value.
    Value(f32),
}

/// Companion depth stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthStreamConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub fps: u32,
    pub laser_power: LaserPower,
    pub auto_exposure: bool,
}

impl Default for DepthStreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 848,
            height: 480,
            format: PixelFormat::Z16,
            fps: 60,
            laser_power: LaserPower::Max,
            auto_exposure: true,
        }
    }
}

/// Configuration for infrared frame capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device_id: u32,
    /// Infrared sensor index (1 = left imager).
    pub infrared_stream_index: u8,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Infrared pixel format. Only 8-bit is recorded.
    pub format: PixelFormat,
    /// Target frames per second.
    pub fps: u32,
    /// Capture duration in seconds.
    pub duration_secs: u32,
    /// Give up waiting for a frame after this many milliseconds.
    pub frame_timeout_ms: Option<u64>,
    /// Companion depth stream.
    pub depth: DepthStreamConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            infrared_stream_index: 1,
            width: 848,
            height: 480,
            format: PixelFormat::Y8,
            fps: 60,
            duration_secs: 60,
            frame_timeout_ms: None,
            depth: DepthStreamConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Number of frames a full run collects.
    pub fn target_frames(&self) -> u64 {
        u64::from(self.duration_secs) * u64::from(self.fps)
    }

    /// Size in bytes of one infrared frame.
    pub fn frame_bytes(&self) -> usize {
        (self.width as usize) * (self.height as usize) * self.format.bytes_per_pixel()
    }

    /// Frame wait timeout, if configured.
    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        if self.format != PixelFormat::Y8 {
            return Err(ConfigError::UnsupportedFormat(self.format));
        }
        if self.depth.enabled && (self.depth.fps == 0 || self.depth.fps > MAX_FPS) {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid frame rate (must be 1-300 fps)")]
    InvalidFrameRate,
    #[error("capture duration must be at least one second")]
    InvalidDuration,
    #[error("unsupported infrared format {0:?} (only y8 is recorded)")]
    UnsupportedFormat(PixelFormat),
    #[error("invalid experiment timing: {0}")]
    InvalidTiming(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub alt: AltConfig,
}

/// Preview configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Minimum seconds between two publications to the preview buffer.
    pub publish_interval_secs: f64,
    /// Seconds the display waits for input on each pass.
    pub refresh_interval_secs: f64,
    /// Where the snapshot display writes the preview image.
    pub preview_path: PathBuf,
    /// Run without a preview at all.
    pub headless: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            publish_interval_secs: 1.0,
            refresh_interval_secs: 0.001,
            preview_path: PathBuf::from("preview.png"),
            headless: false,
        }
    }
}

impl DisplayConfig {
    pub fn publish_interval(&self) -> Duration {
        seconds(self.publish_interval_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        seconds(self.refresh_interval_secs)
    }
}

/// Converts configured seconds. Negative and NaN map to zero, overflow saturates.
pub(crate) fn seconds(value: f64) -> Duration {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives the frames directory and metadata file.
    pub root: PathBuf,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        config.alt.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_frames(), 3600);
        assert_eq!(config.frame_bytes(), 848 * 480);
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_depth_format_not_recordable() {
        let config = CaptureConfig {
            format: PixelFormat::Z16,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedFormat(PixelFormat::Z16))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            fps = 30
            duration_secs = 2

            [capture.depth]
            enabled = false
            width = 640
            height = 480
            format = "z16"
            fps = 30
            laser_power = { value = 150.0 }
            auto_exposure = false

            [display]
            publish_interval_secs = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.capture.width, 848);
        assert_eq!(config.capture.target_frames(), 60);
        assert_eq!(config.capture.depth.laser_power, LaserPower::Value(150.0));
        assert_eq!(config.display.publish_interval(), Duration::from_millis(500));
        assert!(!config.display.headless);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            FileConfig::from_toml("[capture]\nfps = 0\n"),
            Err(ConfigError::InvalidFrameRate)
        ));
        assert!(matches!(
            FileConfig::from_toml("[capture\n"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
