//! Webcam frame source backed by `nokhwa`.
//!
//! Webcams deliver landscape frames; portrait capture rotates each frame
//! a quarter turn clockwise before handing it on.

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};

use super::config::Orientation;
use super::{Camera, CameraError, CaptureConfig, Frame, PixelFormat};

/// Native camera opened through the platform backend.
#[derive(Default)]
pub struct DeviceCamera {
    device: Option<nokhwa::Camera>,
    orientation: Orientation,
    sequence: u64,
}

impl DeviceCamera {
    /// Creates an unopened camera.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists the human-readable names of attached cameras.
    pub fn list_devices() -> Vec<String> {
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(devices) => devices.iter().map(|d| d.human_name().to_string()).collect(),
            Err(e) => {
                tracing::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }
}

impl Camera for DeviceCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let (width, height) = config.preset.sensor_resolution();
        let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(width, height),
        ));

        let mut device = nokhwa::Camera::new(CameraIndex::Index(config.device_id), requested)
            .map_err(|e| CameraError::DeviceNotFound(e.to_string()))?;
        device
            .open_stream()
            .map_err(|e| CameraError::OutputUnavailable(e.to_string()))?;

        tracing::info!(
            "Camera opened: {} ({}x{})",
            device.info().human_name(),
            device.resolution().width(),
            device.resolution().height()
        );

        self.device = Some(device);
        self.orientation = config.orientation;
        self.sequence = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let device = self.device.as_mut().ok_or(CameraError::NotInitialized)?;
        let buffer = device
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbAFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let (width, height) = (image.width(), image.height());
        let rgba = image.into_raw();
        self.sequence += 1;

        let frame = match self.orientation {
            Orientation::Landscape if width >= height => {
                Frame::new(rgba, width, height, PixelFormat::Rgba8, self.sequence)?
            }
            Orientation::Portrait if height >= width => {
                Frame::new(rgba, width, height, PixelFormat::Rgba8, self.sequence)?
            }
            _ => Frame::new(
                rotate_quarter(&rgba, width, height),
                height,
                width,
                PixelFormat::Rgba8,
                self.sequence,
            )?,
        };
        Ok(frame)
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn close(&mut self) {
        if let Some(mut device) = self.device.take() {
            if let Err(e) = device.stop_stream() {
                tracing::warn!("Failed to stop camera stream: {:?}", e);
            }
        }
        tracing::info!("Camera closed");
    }
}

/// Rotates an RGBA buffer 90 degrees clockwise.
fn rotate_quarter(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let src_idx = (y * w + x) * 4;
            // (x, y) lands at column h-1-y, row x of an h-wide image
            let dst_idx = (x * h + (h - 1 - y)) * 4;
            out[dst_idx..dst_idx + 4].copy_from_slice(&src[src_idx..src_idx + 4]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_clockwise() {
        // 2x1 image: A B  ->  1x2 image: A over B
        let src = [1, 1, 1, 1, 2, 2, 2, 2];
        let out = rotate_quarter(&src, 2, 1);
        assert_eq!(out, vec![1, 1, 1, 1, 2, 2, 2, 2]);

        // 1x2 image: A over B  ->  2x1 image: B A
        let out = rotate_quarter(&src, 1, 2);
        assert_eq!(out, vec![2, 2, 2, 2, 1, 1, 1, 1]);
    }
}
