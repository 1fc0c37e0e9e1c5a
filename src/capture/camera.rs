//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and synthetic sources for testing.

use super::{CaptureConfig, Frame, FrameError, PixelFormat};
use super::config::Orientation;
use thiserror::Error;

/// Errors that can occur during camera operations.
///
/// The configuration variants (see [`CameraError::is_configuration_failure`])
/// leave the preview inactive; the rest only cost a single frame.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No camera matches the configured device.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device opened but cannot deliver a video stream.
    #[error("video output cannot be added to the session: {0}")]
    OutputUnavailable(String),
    /// The device cannot deliver the requested orientation.
    #[error("orientation {0:?} is not supported by the device")]
    OrientationUnsupported(Orientation),
    /// The configuration was rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A single frame could not be read.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The device returned a buffer that does not match its dimensions.
    #[error("camera delivered a malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),
    /// `capture` was called before `open`.
    #[error("camera not initialized")]
    NotInitialized,
}

impl CameraError {
    /// True when the error came from configuring the session rather than
    /// from a single capture.
    pub fn is_configuration_failure(&self) -> bool {
        matches!(
            self,
            CameraError::DeviceNotFound(_)
                | CameraError::OutputUnavailable(_)
                | CameraError::OrientationUnsupported(_)
                | CameraError::ConfigFailed(_)
        )
    }
}

/// Trait for frame sources.
///
/// This abstraction allows swapping between real camera hardware
/// and synthetic implementations for testing.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Synthetic camera producing a moving BGRA gradient.
#[derive(Debug)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    device_present: bool,
    supports_portrait: bool,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            config: None,
            sequence: 0,
            device_present: true,
            supports_portrait: true,
        }
    }
}

impl MockCamera {
    /// Creates a mock camera with a working device.
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose device is never found.
    pub fn without_device() -> Self {
        Self {
            device_present: false,
            ..Self::default()
        }
    }

    /// A camera that only delivers landscape frames.
    pub fn landscape_only() -> Self {
        Self {
            supports_portrait: false,
            ..Self::default()
        }
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if !self.device_present {
            return Err(CameraError::DeviceNotFound(format!(
                "{:?} camera #{}",
                config.position, config.device_id
            )));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        if config.orientation == Orientation::Portrait && !self.supports_portrait {
            return Err(CameraError::OrientationUnsupported(config.orientation));
        }
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!("MockCamera opened with config: {:?}", config);
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
        let (width, height) = config.frame_dimensions();

        let shift = (self.sequence % 256) as u32;
        let mut pixels = Vec::with_capacity((width * height) as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let b = ((x + shift) % 256) as u8;
                let g = ((y + shift) % 256) as u8;
                let r = ((x ^ y) % 256) as u8;
                pixels.extend_from_slice(&[b, g, r, 255]);
            }
        }

        self.sequence += 1;
        Ok(Frame::new(
            pixels,
            width,
            height,
            PixelFormat::Bgra8,
            self.sequence,
        )?)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}
