//! ALT experiment settings.

use crate::capture::{seconds, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Experiment timing, output location and camera settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AltConfig {
    /// Total data collection time in hours.
    pub experiment_hours: f64,
    /// Length of one time slice in minutes.
    pub slice_minutes: f64,
    /// Root directory; must not exist when the experiment starts.
    pub experiment_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub iso: u32,
    pub sharpness: i32,
    pub contrast: i32,
    pub exposure_mode: String,
    pub awb_mode: String,
    /// Key frame period for the encoder. `Some(0)` emits a single initial
    /// key frame; `None` keeps the encoder default.
    pub intra_period: Option<u32>,
    /// Seconds of automatic exposure before settings are locked.
    pub settle_secs: f64,
    /// Seconds to wait after locking before recording starts.
    pub locked_settle_secs: f64,
    /// Interval between analog gain checks while the sensor warms up.
    pub gain_poll_ms: u64,
    /// Replace key-frame zeros with the previous sSAD.
    pub fill_key_frames: bool,
}

impl Default for AltConfig {
    fn default() -> Self {
        Self {
            experiment_hours: 0.5,
            slice_minutes: 6.0,
            experiment_dir: PathBuf::from("./experiment"),
            width: 1280,
            height: 720,
            framerate: 49,
            iso: 1600,
            sharpness: 100,
            contrast: 100,
            exposure_mode: "night".to_string(),
            awb_mode: "auto".to_string(),
            intra_period: None,
            settle_secs: 50.0,
            locked_settle_secs: 10.0,
            gain_poll_ms: 100,
            fill_key_frames: false,
        }
    }
}

impl AltConfig {
    /// Number of whole slices that fit in the experiment.
    pub fn slice_count(&self) -> u64 {
        if self.slice_minutes <= 0.0 || !self.experiment_hours.is_finite() {
            return 0;
        }
        (self.experiment_hours * 60.0 / self.slice_minutes).floor().max(0.0) as u64
    }

    pub fn slice_duration(&self) -> Duration {
        seconds(self.slice_minutes * 60.0)
    }

    pub fn settle(&self) -> Duration {
        seconds(self.settle_secs)
    }

    pub fn locked_settle(&self) -> Duration {
        seconds(self.locked_settle_secs)
    }

    pub fn gain_poll(&self) -> Duration {
        Duration::from_millis(self.gain_poll_ms)
    }

    /// Video file name inside each slice directory.
    pub fn video_file_name(&self) -> String {
        format!("{}x{}.h264", self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.slice_minutes.is_finite() && self.slice_minutes > 0.0) {
            return Err(ConfigError::InvalidTiming(
                "slice length must be positive".into(),
            ));
        }
        if !(self.experiment_hours.is_finite() && self.experiment_hours >= 0.0) {
            return Err(ConfigError::InvalidTiming(
                "experiment duration must not be negative".into(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.framerate == 0 || self.framerate > 90 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let config = AltConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.slice_count(), 5);
        assert_eq!(config.slice_duration(), Duration::from_secs(360));
        assert_eq!(config.video_file_name(), "1280x720.h264");
    }

    #[test]
    fn test_partial_slices_are_dropped() {
        let config = AltConfig {
            experiment_hours: 1.0,
            slice_minutes: 25.0,
            ..Default::default()
        };
        assert_eq!(config.slice_count(), 2);
    }

    #[test]
    fn test_zero_slice_length_invalid() {
        let config = AltConfig {
            slice_minutes: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTiming(_))
        ));
        assert_eq!(config.slice_count(), 0);
    }
}
