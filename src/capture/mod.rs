//! Camera input and frame handling.
//!
//! This module provides abstractions for pulling frames from a camera
//! session and managing capture configuration. Real hardware lives
//! behind the `camera` feature; everything else runs against
//! [`SimulatedCamera`].

mod camera;
mod config;
#[cfg(feature = "camera")]
mod device;
mod frame;
#[cfg_attr(not(feature = "camera"), allow(dead_code))]
mod worker;

pub use camera::{CameraError, CameraSession, CloseCounter, SimulatedCamera};
pub(crate) use config::seconds;
pub use config::{
    CaptureConfig, ConfigError, DepthStreamConfig, DisplayConfig, FileConfig, LaserPower,
    OutputConfig, PixelFormat,
};
#[cfg(feature = "camera")]
pub use device::DeviceCamera;
pub use frame::Frame;
