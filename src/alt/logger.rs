//! The ALT experiment loop.

use super::series::SADS_FILE;
use super::{AltConfig, AltError, MotionCamera, MotionField, SadSeries};
use crate::sharing::StopSignal;
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SLICE_DIR_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const SLEEP_STEP: Duration = Duration::from_millis(100);

/// One recorded time slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSummary {
    pub dir: PathBuf,
    pub frames: usize,
}

/// What an experiment produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AltSummary {
    pub slices: Vec<SliceSummary>,
    pub stopped_early: bool,
}

/// Drives a [`MotionCamera`] through warm-up and the time slices.
pub struct AltLogger<C: MotionCamera> {
    camera: C,
    config: AltConfig,
    stop: StopSignal,
}

impl<C: MotionCamera> AltLogger<C> {
    pub fn new(camera: C, config: AltConfig, stop: StopSignal) -> Self {
        Self {
            camera,
            config,
            stop,
        }
    }

    /// Runs the whole experiment. The camera is closed before returning.
    pub fn run(&mut self) -> Result<AltSummary, AltError> {
        self.config.validate()?;
        create_experiment_dir(&self.config.experiment_dir)?;

        let result = self.run_with_camera();
        self.camera.close();
        result
    }

    /// Returns the camera, e.g. to inspect a simulated one after a run.
    pub fn into_camera(self) -> C {
        self.camera
    }

    fn run_with_camera(&mut self) -> Result<AltSummary, AltError> {
        let mut summary = AltSummary::default();

        self.camera.configure(&self.config)?;
        if !self.wait_for_gain()? {
            summary.stopped_early = true;
            return Ok(summary);
        }

        let total = self.config.settle() + self.config.locked_settle();
        tracing::info!(remaining_secs = total.as_secs(), "Preparing");
        if !self.sleep(self.config.settle()) {
            summary.stopped_early = true;
            return Ok(summary);
        }

        self.camera.lock_exposure()?;
        tracing::info!(
            remaining_secs = self.config.locked_settle().as_secs(),
            "Exposure locked"
        );
        if !self.sleep(self.config.locked_settle()) {
            summary.stopped_early = true;
            return Ok(summary);
        }

        let slices = self.config.slice_count();
        tracing::info!(slices, "Running");

        for index in 0..slices {
            if self.stop.is_stopped() {
                summary.stopped_early = true;
                break;
            }
            let slice = self.record_slice()?;
            tracing::info!(
                slice = index + 1,
                of = slices,
                frames = slice.frames,
                dir = %slice.dir.display(),
                "Time slice complete"
            );
            summary.slices.push(slice);
        }

        Ok(summary)
    }

    /// Polls analog gain until it exceeds 1. Returns false if stopped first.
    fn wait_for_gain(&mut self) -> Result<bool, AltError> {
        loop {
            if self.stop.is_stopped() {
                return Ok(false);
            }
            let gain = self.camera.analog_gain()?;
            if gain > 1.0 {
                tracing::debug!(gain, "Sensor gain settled");
                return Ok(true);
            }
            std::thread::sleep(self.config.gain_poll());
        }
    }

    fn record_slice(&mut self) -> Result<SliceSummary, AltError> {
        let name = Local::now().format(SLICE_DIR_FORMAT).to_string();
        let dir = self.config.experiment_dir.join(name);
        fs::create_dir(&dir).map_err(|source| AltError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut series = SadSeries::new(self.config.fill_key_frames);
        self.camera.record_segment(
            &dir.join(self.config.video_file_name()),
            self.config.slice_duration(),
            &mut |field: &MotionField| series.push(field.ssad()),
        )?;

        // Writing after recording leaves a short gap between slices.
        series.write_to(&dir.join(SADS_FILE))?;

        Ok(SliceSummary {
            dir,
            frames: series.len(),
        })
    }

    /// Sleeps in short steps so a stop request is noticed. Returns false if stopped.
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_STEP.min(deadline - now));
        }
    }
}

/// Creates the experiment root, failing if it already exists.
fn create_experiment_dir(root: &Path) -> Result<(), AltError> {
    let io_err = |path: &Path, source| AltError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = root.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    match fs::create_dir(root) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(AltError::OutputExists(root.to_path_buf()))
        }
        Err(e) => Err(io_err(root, e)),
    }
}
