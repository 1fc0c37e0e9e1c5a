//! Display side of the preview.
//!
//! The frame worker hands finished images to a [`DisplaySink`]; the UI
//! thread pumps a [`DisplaySurface`] and draws whatever is current.

mod image;
mod surface;

pub use self::image::{to_rgba_image, Applied, DisplayImage};
pub use surface::{channel, DisplayHandle, DisplaySink, DisplaySurface};
