//! Frame type representing a captured image with metadata.

use std::time::Instant;
use thiserror::Error;

/// Pixel layouts a frame source may deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit blue, green, red, alpha (the usual camera native layout).
    Bgra8,
    /// 8-bit red, green, blue, alpha.
    Rgba8,
    /// 8-bit packed red, green, blue.
    Rgb8,
    /// 8-bit luminance.
    Gray8,
}

impl PixelFormat {
    /// Bytes used by one pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Frame construction errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height is zero.
    #[error("frame dimensions must be non-zero")]
    EmptyDimensions,
    /// Buffer length does not match `width * height` pixels of `format`.
    #[error("pixel buffer holds {actual} bytes, {width}x{height} {format:?} needs {expected}")]
    BufferSizeMismatch {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
        /// Declared pixel layout.
        format: PixelFormat,
        /// Bytes the dimensions call for.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}

/// Checks that a buffer of `len` bytes holds exactly `width` x `height`
/// pixels of `format`.
pub(crate) fn check_buffer(
    len: usize,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::EmptyDimensions);
    }
    let expected = (width as usize) * (height as usize) * format.bytes_per_pixel();
    if len != expected {
        return Err(FrameError::BufferSizeMismatch {
            width,
            height,
            format,
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// A single captured frame from the camera.
///
/// The buffer length always matches the dimensions and pixel format;
/// [`Frame::new`] refuses anything else, so downstream conversion never
/// has to deal with a short buffer.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    timestamp: Instant,
    sequence: u64,
}

impl Frame {
    /// Creates a new frame, validating the buffer against its dimensions.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> Result<Self, FrameError> {
        check_buffer(pixels.len(), width, height, format)?;
        Ok(Self {
            pixels,
            width,
            height,
            format,
            timestamp: Instant::now(),
            sequence,
        })
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the monotonic sequence number assigned by the source.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Reads one pixel as RGBA regardless of the native layout.
    pub fn rgba_at(&self, index: usize) -> [u8; 4] {
        let bpp = self.format.bytes_per_pixel();
        let p = &self.pixels[index * bpp..(index + 1) * bpp];
        match self.format {
            PixelFormat::Bgra8 => [p[2], p[1], p[0], p[3]],
            PixelFormat::Rgba8 => [p[0], p[1], p[2], p[3]],
            PixelFormat::Rgb8 => [p[0], p[1], p[2], 255],
            PixelFormat::Gray8 => [p[0], p[0], p[0], 255],
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
