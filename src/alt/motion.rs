//! Motion data produced by the video encoder.

use super::{AltConfig, AltError};
use crate::capture::CameraError;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

/// One macroblock's motion estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionVector {
    pub dx: i8,
    pub dy: i8,
    /// Sum of absolute differences for the block.
    pub sad: u16,
}

/// Motion estimates for every macroblock of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionField {
    pub columns: usize,
    pub rows: usize,
    pub vectors: Vec<MotionVector>,
}

impl MotionField {
    /// Macroblock grid for a frame size. The encoder adds one spare column.
    pub fn dimensions_for(width: u32, height: u32) -> (usize, usize) {
        let columns = (width as usize).div_ceil(16) + 1;
        let rows = (height as usize).div_ceil(16);
        (columns, rows)
    }

    /// A field where nothing was predicted, as for a key frame.
    pub fn key_frame(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            vectors: vec![MotionVector::default(); columns * rows],
        }
    }

    /// Sum of all block SADs. Zero for key frames.
    pub fn ssad(&self) -> u64 {
        self.vectors.iter().map(|v| u64::from(v.sad)).sum()
    }
}

/// A camera whose encoder reports motion fields while recording.
pub trait MotionCamera {
    /// Applies resolution, frame rate, ISO and image settings.
    fn configure(&mut self, config: &AltConfig) -> Result<(), AltError>;

    /// Current sensor analog gain.
    fn analog_gain(&mut self) -> Result<f64, AltError>;

    /// Fixes shutter speed and white balance at their current values.
    fn lock_exposure(&mut self) -> Result<(), AltError>;

    /// Records `duration` of video to `video_path`, calling `on_motion`
    /// once per encoded frame in frame order.
    fn record_segment(
        &mut self,
        video_path: &Path,
        duration: Duration,
        on_motion: &mut dyn FnMut(&MotionField),
    ) -> Result<(), AltError>;

    /// Releases the camera.
    fn close(&mut self);
}

const DEFAULT_SEED: u64 = 49;

/// Camera stand-in producing deterministic motion fields.
///
/// Analog gain starts low and rises on every query, so the warm-up wait
/// completes after a few polls. The video file holds a short marker
/// rather than an encoded stream.
#[derive(Debug, Clone)]
pub struct SimulatedMotionCamera {
    config: Option<AltConfig>,
    gain: f64,
    gain_step: f64,
    paced: bool,
    rng: ChaCha8Rng,
    locked: bool,
}

impl SimulatedMotionCamera {
    pub fn new() -> Self {
        Self {
            config: None,
            gain: 0.5,
            gain_step: 0.25,
            paced: false,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_SEED),
            locked: false,
        }
    }

    /// Records in real time instead of as fast as possible.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    /// Reseeds the motion generator; equal seeds give equal fields.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn predicted_field(&mut self, columns: usize, rows: usize) -> MotionField {
        let vectors = (0..columns * rows)
            .map(|_| {
                let r = self.rng.next_u64();
                MotionVector {
                    dx: (r & 0x07) as i8 - 4,
                    dy: ((r >> 3) & 0x07) as i8 - 4,
                    sad: 1 + ((r >> 8) % 512) as u16,
                }
            })
            .collect();
        MotionField {
            columns,
            rows,
            vectors,
        }
    }
}

impl Default for SimulatedMotionCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionCamera for SimulatedMotionCamera {
    fn configure(&mut self, config: &AltConfig) -> Result<(), AltError> {
        config.validate()?;
        tracing::info!(
            width = config.width,
            height = config.height,
            framerate = config.framerate,
            iso = config.iso,
            exposure_mode = %config.exposure_mode,
            "SimulatedMotionCamera configured"
        );
        self.config = Some(config.clone());
        Ok(())
    }

    fn analog_gain(&mut self) -> Result<f64, AltError> {
        if self.config.is_none() {
            return Err(CameraError::NotInitialized.into());
        }
        let gain = self.gain;
        self.gain += self.gain_step;
        Ok(gain)
    }

    fn lock_exposure(&mut self) -> Result<(), AltError> {
        if self.config.is_none() {
            return Err(CameraError::NotInitialized.into());
        }
        self.locked = true;
        tracing::info!(gain = self.gain, "Exposure and white balance locked");
        Ok(())
    }

    fn record_segment(
        &mut self,
        video_path: &Path,
        duration: Duration,
        on_motion: &mut dyn FnMut(&MotionField),
    ) -> Result<(), AltError> {
        let config = self.config.clone().ok_or(CameraError::NotInitialized)?;

        let io_err = |source| AltError::Io {
            path: video_path.to_path_buf(),
            source,
        };
        let mut video = File::create(video_path).map_err(io_err)?;
        video.write_all(b"simulated h264\n").map_err(io_err)?;

        let frames = (duration.as_secs_f64() * f64::from(config.framerate)).round() as u64;
        let period = Duration::from_secs_f64(1.0 / f64::from(config.framerate));
        let (columns, rows) = MotionField::dimensions_for(config.width, config.height);
        let started = Instant::now();

        for index in 0..frames {
            let key_frame = match config.intra_period {
                None => index % 60 == 0,
                Some(0) => index == 0,
                Some(n) => index % u64::from(n) == 0,
            };
            let field = if key_frame {
                MotionField::key_frame(columns, rows)
            } else {
                self.predicted_field(columns, rows)
            };
            on_motion(&field);

            if self.paced {
                let due = period.mul_f64((index + 1) as f64);
                if let Some(wait) = due.checked_sub(started.elapsed()) {
                    std::thread::sleep(wait);
                }
            }
        }

        tracing::debug!(frames, path = %video_path.display(), "Segment recorded");
        Ok(())
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            tracing::info!("SimulatedMotionCamera closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_for_hd() {
        assert_eq!(MotionField::dimensions_for(1280, 720), (81, 45));
    }

    #[test]
    fn test_key_frame_has_zero_ssad() {
        assert_eq!(MotionField::key_frame(81, 45).ssad(), 0);
    }

    #[test]
    fn test_ssad_sums_blocks() {
        let field = MotionField {
            columns: 2,
            rows: 1,
            vectors: vec![
                MotionVector { dx: 1, dy: 0, sad: 300 },
                MotionVector { dx: -2, dy: 3, sad: 65535 },
            ],
        };
        assert_eq!(field.ssad(), 65835);
    }

    #[test]
    fn test_gain_rises() {
        let mut camera = SimulatedMotionCamera::new();
        assert!(camera.analog_gain().is_err());

        camera.configure(&AltConfig::default()).unwrap();
        let first = camera.analog_gain().unwrap();
        let second = camera.analog_gain().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_same_seed_same_motion() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AltConfig {
            width: 32,
            height: 32,
            framerate: 5,
            intra_period: Some(0),
            ..Default::default()
        };
        let record = |camera: SimulatedMotionCamera, name: &str| {
            let mut camera = camera;
            camera.configure(&config).unwrap();
            let mut sums = Vec::new();
            camera
                .record_segment(
                    &tmp.path().join(name),
                    Duration::from_secs(2),
                    &mut |field: &MotionField| sums.push(field.ssad()),
                )
                .unwrap();
            sums
        };

        let a = record(SimulatedMotionCamera::new().with_seed(7), "a.h264");
        let b = record(SimulatedMotionCamera::new().with_seed(7), "b.h264");
        let c = record(SimulatedMotionCamera::new().with_seed(8), "c.h264");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_record_segment_reports_every_frame() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AltConfig {
            width: 64,
            height: 32,
            framerate: 10,
            intra_period: Some(0),
            ..Default::default()
        };
        let mut camera = SimulatedMotionCamera::new();
        camera.configure(&config).unwrap();

        let mut sums = Vec::new();
        camera
            .record_segment(
                &tmp.path().join("v.h264"),
                Duration::from_secs(2),
                &mut |field: &MotionField| sums.push(field.ssad()),
            )
            .unwrap();

        assert_eq!(sums.len(), 20);
        assert_eq!(sums[0], 0);
        assert!(sums[1..].iter().all(|&s| s > 0));
        assert!(tmp.path().join("v.h264").exists());
    }
}
