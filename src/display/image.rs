//! Displayable images and pixel layout conversion.

use std::time::Instant;

use image::RgbaImage;

use crate::capture::PixelFormat;
use crate::control::{ComputeUnits, StyleId};

/// The configuration an image was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The raw frame.
    PassThrough,
    /// Output of a style model.
    Styled {
        /// Style that was applied.
        style: StyleId,
        /// Preference the model ran with.
        units: ComputeUnits,
    },
}

/// An image ready for the display surface.
#[derive(Clone)]
pub struct DisplayImage {
    image: RgbaImage,
    sequence: u64,
    applied: Applied,
    captured_at: Instant,
}

impl DisplayImage {
    /// Wraps converted pixels with the frame they came from.
    pub fn new(image: RgbaImage, sequence: u64, applied: Applied, captured_at: Instant) -> Self {
        Self {
            image,
            sequence,
            applied,
            captured_at,
        }
    }

    /// Pixels to draw.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consumes the image and returns its pixels.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Sequence number of the frame this image came from.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// What produced this image.
    pub fn applied(&self) -> Applied {
        self.applied
    }

    /// Capture time of the source frame.
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for DisplayImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayImage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("sequence", &self.sequence)
            .field("applied", &self.applied)
            .finish()
    }
}

/// Converts a validated pixel buffer to RGBA without resampling.
///
/// `pixels` must hold exactly `width * height` pixels of `format`.
pub fn to_rgba_image(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> RgbaImage {
    debug_assert_eq!(
        pixels.len(),
        (width as usize) * (height as usize) * format.bytes_per_pixel()
    );

    let mut image = RgbaImage::new(width, height);
    let dst = image.chunks_exact_mut(4);
    match format {
        PixelFormat::Rgba8 => {
            for (d, s) in dst.zip(pixels.chunks_exact(4)) {
                d.copy_from_slice(s);
            }
        }
        PixelFormat::Bgra8 => {
            for (d, s) in dst.zip(pixels.chunks_exact(4)) {
                d.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
            }
        }
        PixelFormat::Rgb8 => {
            for (d, s) in dst.zip(pixels.chunks_exact(3)) {
                d.copy_from_slice(&[s[0], s[1], s[2], 255]);
            }
        }
        PixelFormat::Gray8 => {
            for (d, &v) in dst.zip(pixels.iter()) {
                d.copy_from_slice(&[v, v, v, 255]);
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Frame;
    use proptest::prelude::*;

    #[test]
    fn test_bgra_swizzle() {
        let image = to_rgba_image(&[1, 2, 3, 4], 1, 1, PixelFormat::Bgra8);
        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1, 4]);
    }

    #[test]
    fn test_rgb_gets_opaque_alpha() {
        let image = to_rgba_image(&[9, 8, 7, 6, 5, 4], 2, 1, PixelFormat::Rgb8);
        assert_eq!(image.get_pixel(1, 0).0, [6, 5, 4, 255]);
    }

    proptest! {
        #[test]
        fn conversion_preserves_dimensions_and_content(
            width in 1u32..24,
            height in 1u32..24,
            seed in any::<u8>(),
        ) {
            let len = (width * height * 4) as usize;
            let pixels: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31) ^ seed).collect();
            let frame = Frame::new(pixels, width, height, PixelFormat::Bgra8, 0).unwrap();

            let image = to_rgba_image(frame.pixels(), width, height, frame.format());

            prop_assert_eq!(image.dimensions(), (width, height));
            for (i, pixel) in image.pixels().enumerate() {
                prop_assert_eq!(pixel.0, frame.rgba_at(i));
            }
        }
    }
}
