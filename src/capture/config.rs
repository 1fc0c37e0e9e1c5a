//! Camera capture configuration.
//!
//! The preview runs from the back camera in portrait orientation at a
//! medium quality preset unless told otherwise.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which physical camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CameraPosition {
    /// Rear-facing camera.
    #[default]
    Back,
    /// Front-facing camera.
    Front,
}

/// Orientation frames are delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Capture quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePreset {
    /// 192x144.
    Low,
    /// 480x360.
    #[default]
    Medium,
    /// 1280x720.
    High,
}

impl CapturePreset {
    /// Sensor resolution for the preset, landscape (width, height).
    pub const fn sensor_resolution(self) -> (u32, u32) {
        match self {
            CapturePreset::Low => (192, 144),
            CapturePreset::Medium => (480, 360),
            CapturePreset::High => (1280, 720),
        }
    }
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device_id: u32,
    /// Which side of the device to use.
    pub position: CameraPosition,
    /// Orientation frames are delivered in.
    pub orientation: Orientation,
    /// Sensor resolution preset.
    pub preset: CapturePreset,
    /// Target frames per second.
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            position: CameraPosition::Back,
            orientation: Orientation::Portrait,
            preset: CapturePreset::Medium,
            fps: 30,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the given preset and defaults elsewhere.
    pub fn with_preset(preset: CapturePreset) -> Self {
        Self {
            preset,
            ..Default::default()
        }
    }

    /// Delivered frame dimensions (width, height) after orientation.
    pub fn frame_dimensions(&self) -> (u32, u32) {
        let (w, h) = self.preset.sensor_resolution();
        match self.orientation {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        if self.fps == 0 || self.fps > 120 {
            return Err(CaptureConfigError::InvalidFrameRate(self.fps));
        }
        Ok(())
    }
}

/// Capture configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureConfigError {
    /// Frame rate outside 1..=120.
    #[error("invalid frame rate {0} (must be 1-120 fps)")]
    InvalidFrameRate(u32),
}
