//! Camera input and frame handling.
//!
//! A frame source delivers a continuous, discardable sequence of frames.
//! Frames are only borrowed by consumers; anything that needs one past
//! the delivery call must copy it.

mod camera;
mod config;
#[cfg(feature = "camera")]
mod device;
mod frame;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::{CameraPosition, CaptureConfig, CaptureConfigError, CapturePreset, Orientation};
#[cfg(feature = "camera")]
pub use device::DeviceCamera;
pub use frame::{Frame, FrameError, PixelFormat};
pub(crate) use frame::check_buffer;
