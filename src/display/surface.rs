//! Delivery of images to the thread that owns the display.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::DisplayImage;

/// Accepts finished images.
///
/// Implementations must not block: the caller is the frame worker.
pub trait DisplaySink: Send {
    /// Hands over one finished image.
    fn deliver(&self, image: DisplayImage);
}

impl<F> DisplaySink for F
where
    F: Fn(DisplayImage) + Send,
{
    fn deliver(&self, image: DisplayImage) {
        self(image)
    }
}

/// Creates a connected handle/surface pair.
pub fn channel() -> (DisplayHandle, DisplaySurface) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        DisplayHandle { tx },
        DisplaySurface {
            rx,
            current: None,
            shown: 0,
            stale: 0,
        },
    )
}

/// Sending half, handed to the frame worker.
#[derive(Clone, Debug)]
pub struct DisplayHandle {
    tx: Sender<DisplayImage>,
}

impl DisplaySink for DisplayHandle {
    fn deliver(&self, image: DisplayImage) {
        if self.tx.send(image).is_err() {
            tracing::trace!("Display surface gone, image discarded");
        }
    }
}

/// Receiving half, owned by the display thread.
///
/// Shows the newest image only, ordered by capture time with the frame
/// sequence as tie-break. An image older than the one on screen is
/// discarded, so a late result never replaces a newer frame. Capture time
/// keeps increasing across camera restarts, where sequences start over.
#[derive(Debug)]
pub struct DisplaySurface {
    rx: Receiver<DisplayImage>,
    current: Option<DisplayImage>,
    shown: u64,
    stale: u64,
}

impl DisplaySurface {
    /// Applies all pending images. Returns true if the shown image changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(image) = self.rx.try_recv() {
            changed |= self.accept(image);
        }
        changed
    }

    /// Waits up to `timeout` for a new image, then applies anything else
    /// pending. Returns true if the shown image changed.
    pub fn wait_for_update(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(image) => {
                let changed = self.accept(image);
                self.pump() || changed
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// The image currently on screen.
    pub fn current(&self) -> Option<&DisplayImage> {
        self.current.as_ref()
    }

    /// Number of images that made it on screen.
    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// Number of images discarded for being older than the one shown.
    pub fn stale(&self) -> u64 {
        self.stale
    }

    fn accept(&mut self, image: DisplayImage) -> bool {
        if let Some(current) = &self.current {
            if order_key(&image) <= order_key(current) {
                self.stale += 1;
                tracing::debug!(
                    sequence = image.sequence(),
                    shown = current.sequence(),
                    "Discarded stale image"
                );
                return false;
            }
        }
        self.current = Some(image);
        self.shown += 1;
        true
    }
}

fn order_key(image: &DisplayImage) -> (Instant, u64) {
    (image.captured_at(), image.sequence())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Applied;
    use image::RgbaImage;
    use std::sync::OnceLock;

    fn captured(sequence: u64, captured_at: Instant) -> DisplayImage {
        DisplayImage::new(RgbaImage::new(2, 2), sequence, Applied::PassThrough, captured_at)
    }

    // Later sequences are captured later, as from a single camera session.
    fn image(sequence: u64) -> DisplayImage {
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let epoch = *EPOCH.get_or_init(Instant::now);
        captured(sequence, epoch + Duration::from_millis(sequence))
    }

    #[test]
    fn test_newest_image_wins() {
        let (handle, mut surface) = channel();
        handle.deliver(image(1));
        handle.deliver(image(2));

        assert!(surface.pump());
        assert_eq!(surface.current().map(|i| i.sequence()), Some(2));
        assert_eq!(surface.shown(), 2);
    }

    #[test]
    fn test_older_image_never_overwrites() {
        let (handle, mut surface) = channel();
        handle.deliver(image(5));
        surface.pump();

        handle.deliver(image(3));
        assert!(!surface.pump());
        assert_eq!(surface.current().map(|i| i.sequence()), Some(5));
        assert_eq!(surface.stale(), 1);
    }

    #[test]
    fn test_wait_times_out_without_images() {
        let (_handle, mut surface) = channel();
        assert!(!surface.wait_for_update(Duration::from_millis(5)));
        assert!(surface.current().is_none());
    }

    #[test]
    fn test_closure_sink() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sink = move |image: DisplayImage| {
            let _ = tx.send(image.sequence());
        };
        sink.deliver(image(9));
        assert_eq!(rx.try_recv(), Ok(9));
    }

    #[test]
    fn test_restarted_sequence_still_replaces_older_capture() {
        let (handle, mut surface) = channel();
        let first_run = Instant::now();
        let second_run = first_run + Duration::from_millis(500);

        handle.deliver(captured(5, first_run));
        handle.deliver(captured(1, second_run));

        assert!(surface.pump());
        assert_eq!(surface.current().map(|i| i.captured_at()), Some(second_run));
        assert_eq!(surface.current().map(|i| i.sequence()), Some(1));
        assert_eq!(surface.stale(), 0);
    }

    #[test]
    fn test_same_capture_time_falls_back_to_sequence() {
        let (handle, mut surface) = channel();
        let at = Instant::now();
        handle.deliver(captured(2, at));
        handle.deliver(captured(1, at));

        surface.pump();
        assert_eq!(surface.current().map(|i| i.sequence()), Some(2));
        assert_eq!(surface.stale(), 1);
    }
}
