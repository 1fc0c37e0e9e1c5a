//! Model output buffer.

use crate::capture::{check_buffer, FrameError, PixelFormat};

/// Pixels produced by one inference pass.
///
/// Same validation rules as a captured frame: the buffer length always
/// matches the dimensions.
#[derive(Clone)]
pub struct OutputBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl OutputBuffer {
    /// Wraps a model output, checking its length against the dimensions.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, FrameError> {
        check_buffer(pixels.len(), width, height, format)?;
        Ok(Self {
            pixels,
            width,
            height,
            format,
        })
    }

    #[inline]
    /// Raw pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    /// Pixel layout of the output.
    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}
