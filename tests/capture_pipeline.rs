//! End-to-end capture runs against the simulated camera.

use lab_capture::capture::{CaptureConfig, SimulatedCamera};
use lab_capture::display::{HeadlessDisplay, QuitKey};
use lab_capture::pipeline::CaptureSession;
use lab_capture::recording::{frame_file_name, RecordingLayout};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn headless() -> Result<HeadlessDisplay, lab_capture::display::DisplayError> {
    Ok(HeadlessDisplay::new(
        Duration::from_millis(1),
        QuitKey::manual(),
    ))
}

fn frame_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_full_resolution_run() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CaptureConfig {
        duration_secs: 2,
        ..CaptureConfig::default()
    };
    assert_eq!((config.width, config.height, config.fps), (848, 480, 60));

    let session =
        CaptureSession::new(config, Duration::ZERO, RecordingLayout::now(tmp.path())).unwrap();
    let report = session.run(SimulatedCamera::new, headless).unwrap();

    assert_eq!(report.capture.frames_captured, 120);
    assert!(report.capture.reached_target);

    let files = frame_files(&report.layout.frames_dir);
    assert_eq!(files.len(), 120);
    assert_eq!(files[0], "000000001.dat");
    assert_eq!(files[119], "000000120.dat");
    for name in [&files[0], &files[119]] {
        let len = fs::metadata(report.layout.frames_dir.join(name)).unwrap().len();
        assert_eq!(len, 848 * 480);
    }

    let meta = fs::read_to_string(&report.layout.metadata_file).unwrap();
    let lines: Vec<&str> = meta.lines().collect();
    assert_eq!(lines.len(), 120);
    assert_eq!(lines[0], "1 0 0 NaN");
    assert!(lines[1].starts_with("2 "));
    assert!(!lines[1].ends_with("NaN"));

    let latest = session.buffer().latest_number().unwrap();
    assert_eq!(latest, 120);
    assert_eq!(
        session.buffer().snapshot(),
        SimulatedCamera::pattern(latest, 848, 480)
    );
}

#[test]
fn test_file_names_follow_device_numbers() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CaptureConfig {
        fps: 10,
        duration_secs: 1,
        ..CaptureConfig::with_dimensions(16, 8)
    };
    let session =
        CaptureSession::new(config, Duration::ZERO, RecordingLayout::now(tmp.path())).unwrap();
    let report = session
        .run(|| SimulatedCamera::new().with_numbering(100, 3), headless)
        .unwrap();

    let expected: Vec<String> = (0..10).map(|i| frame_file_name(100 + i * 3)).collect();
    assert_eq!(frame_files(&report.layout.frames_dir), expected);

    let meta = fs::read_to_string(&report.layout.metadata_file).unwrap();
    let numbers: Vec<&str> = meta
        .lines()
        .map(|line| line.split(' ').next().unwrap())
        .collect();
    assert_eq!(numbers.first(), Some(&"100"));
    assert_eq!(numbers.last(), Some(&"127"));
}

#[test]
fn test_preview_is_throttled() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CaptureConfig {
        fps: 200,
        duration_secs: 1,
        ..CaptureConfig::with_dimensions(32, 16)
    };
    let session = CaptureSession::new(
        config,
        Duration::from_millis(100),
        RecordingLayout::now(tmp.path()),
    )
    .unwrap();
    let report = session
        .run(|| SimulatedCamera::new().paced(), headless)
        .unwrap();

    assert_eq!(report.capture.frames_captured, 200);
    assert!(report.capture.frames_published >= 2);
    assert!(report.capture.frames_published < report.capture.frames_captured / 2);
    assert_eq!(
        frame_files(&report.layout.frames_dir).len(),
        200,
        "every frame is written regardless of the preview"
    );
}

#[test]
fn test_stop_mid_run_releases_camera_once() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CaptureConfig {
        fps: 60,
        duration_secs: 60,
        ..CaptureConfig::with_dimensions(16, 8)
    };
    let session =
        CaptureSession::new(config, Duration::ZERO, RecordingLayout::now(tmp.path())).unwrap();

    let camera = SimulatedCamera::new().paced();
    let closes = camera.close_counter();
    let stop = session.stop_signal();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        stop.request_stop();
    });

    let report = session.run(move || camera, headless).unwrap();
    stopper.join().unwrap();

    let captured = report.capture.frames_captured;
    assert!(captured > 0);
    assert!(captured < 3600);
    assert!(!report.capture.reached_target);
    assert_eq!(closes.get(), 1);
    assert_eq!(frame_files(&report.layout.frames_dir).len() as u64, captured);

    let meta = fs::read_to_string(&report.layout.metadata_file).unwrap();
    assert_eq!(meta.lines().count() as u64, captured);
}

#[test]
fn test_device_failure_keeps_recorded_frames() {
    let tmp = tempfile::tempdir().unwrap();
    let config = CaptureConfig {
        fps: 30,
        duration_secs: 1,
        ..CaptureConfig::with_dimensions(16, 8)
    };
    let session =
        CaptureSession::new(config, Duration::ZERO, RecordingLayout::now(tmp.path())).unwrap();
    let layout = session.layout().clone();

    let result = session.run(|| SimulatedCamera::new().failing_after(5), headless);

    assert!(result.is_err());
    assert!(session.stop_signal().is_stopped());
    assert_eq!(frame_files(&layout.frames_dir).len(), 5);
    let meta = fs::read_to_string(&layout.metadata_file).unwrap();
    assert_eq!(meta.lines().count(), 5);
}
