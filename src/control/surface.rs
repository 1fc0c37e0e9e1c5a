//! Shared, lock-free control state.
//!
//! Mode and style are packed into one `AtomicU32` (mode index in the low
//! byte, style index in the next) so a reader always sees a pair that was
//! written together.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use thiserror::Error;

use super::selection::{ComputeUnits, ModeOption, ModeSelector, ProcessingMode, StyleId};

/// Rejected control input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    /// Mode selector index past the last option.
    #[error("mode index {index} out of range (selector has {len} options)")]
    ModeIndexOutOfRange {
        /// Index the control reported.
        index: usize,
        /// Number of mode options.
        len: usize,
    },
    /// Style selector index past the seventh style.
    #[error("style index {index} out of range (there are {len} styles)")]
    StyleIndexOutOfRange {
        /// Index the control reported.
        index: usize,
        /// Number of styles.
        len: usize,
    },
}

/// Mode and style as read at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlSnapshot {
    pub mode: ProcessingMode,
    /// Selected style.
    pub style: StyleId,
}

impl ControlSnapshot {
    /// Pairs a mode with a style.
    pub fn new(mode: ProcessingMode, style: StyleId) -> Self {
        Self { mode, style }
    }

    fn pack(self) -> u32 {
        (self.mode.index() as u32) | ((self.style.index() as u32) << 8)
    }

    // Only values produced by `pack` are ever stored.
    fn unpack(word: u32) -> Self {
        Self {
            mode: ProcessingMode::ALL[(word & 0xff) as usize],
            style: StyleId::ALL[((word >> 8) & 0xff) as usize],
        }
    }
}

struct Shared {
    word: AtomicU32,
    options: Vec<ModeOption>,
}

/// The two user-settable selections.
///
/// Cloning is cheap; all clones share the same state. Writers are the UI
/// controls, the reader is the frame worker.
#[derive(Clone)]
pub struct ControlSurface {
    shared: Arc<Shared>,
}

impl ControlSurface {
    /// Creates a surface with the given mode selector layout, starting at
    /// pass-through and the first style.
    pub fn new(selector: ModeSelector, on_units: ComputeUnits) -> Self {
        Self {
            shared: Arc::new(Shared {
                word: AtomicU32::new(ControlSnapshot::default().pack()),
                options: selector.options(on_units),
            }),
        }
    }

    /// Segments of the mode control, in index order.
    pub fn mode_options(&self) -> &[ModeOption] {
        &self.shared.options
    }

    /// Segments of the style control, in index order.
    pub fn style_options(&self) -> [&'static str; 7] {
        StyleId::ALL.map(StyleId::name)
    }

    /// Handles a mode selector change event.
    pub fn set_mode(&self, index: usize) -> Result<ProcessingMode, ControlError> {
        let option = self
            .shared
            .options
            .get(index)
            .ok_or(ControlError::ModeIndexOutOfRange {
                index,
                len: self.shared.options.len(),
            })?;
        self.set_processing_mode(option.mode);
        Ok(option.mode)
    }

    /// Handles a style selector change event.
    pub fn set_style(&self, index: usize) -> Result<StyleId, ControlError> {
        let style = StyleId::from_index(index).ok_or(ControlError::StyleIndexOutOfRange {
            index,
            len: StyleId::ALL.len(),
        })?;
        self.set_style_id(style);
        Ok(style)
    }

    /// Selects `mode` directly, bypassing the selector layout.
    pub fn set_processing_mode(&self, mode: ProcessingMode) {
        self.update(|snapshot| ControlSnapshot { mode, ..snapshot });
        tracing::debug!(%mode, "Processing mode changed");
    }

    /// Selects `style` directly.
    pub fn set_style_id(&self, style: StyleId) {
        self.update(|snapshot| ControlSnapshot { style, ..snapshot });
        tracing::debug!(%style, "Style changed");
    }

    /// Replaces mode and style in one store.
    pub fn apply(&self, snapshot: ControlSnapshot) {
        self.shared.word.store(snapshot.pack(), Ordering::Release);
    }

    /// Reads mode and style together.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot::unpack(self.shared.word.load(Ordering::Acquire))
    }

    /// Index of the current mode in [`ControlSurface::mode_options`], if the
    /// current mode is reachable from this selector.
    pub fn selected_mode_index(&self) -> Option<usize> {
        let mode = self.snapshot().mode;
        self.shared.options.iter().position(|o| o.mode == mode)
    }

    fn update(&self, f: impl Fn(ControlSnapshot) -> ControlSnapshot) {
        // The closure never returns None, so this cannot fail.
        let _ = self
            .shared
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                Some(f(ControlSnapshot::unpack(word)).pack())
            });
    }
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self::new(ModeSelector::default(), ComputeUnits::default())
    }
}

impl std::fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSurface")
            .field("snapshot", &self.snapshot())
            .field("mode_options", &self.shared.options.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_starts_pass_through() {
        let control = ControlSurface::default();
        assert_eq!(
            control.snapshot(),
            ControlSnapshot::new(ProcessingMode::PassThrough, StyleId::Style1)
        );
        assert_eq!(control.selected_mode_index(), Some(0));
    }

    #[test]
    fn test_on_off_selector() {
        let control = ControlSurface::new(ModeSelector::OnOff, ComputeUnits::CpuOnly);

        assert_eq!(
            control.set_mode(1),
            Ok(ProcessingMode::Infer(ComputeUnits::CpuOnly))
        );
        assert_eq!(
            control.set_mode(2),
            Err(ControlError::ModeIndexOutOfRange { index: 2, len: 2 })
        );
        // rejected input leaves the state alone
        assert_eq!(
            control.snapshot().mode,
            ProcessingMode::Infer(ComputeUnits::CpuOnly)
        );
    }

    #[test]
    fn test_full_selector_reaches_every_mode() {
        let control = ControlSurface::new(ModeSelector::Full, ComputeUnits::Automatic);
        for (i, expected) in ProcessingMode::ALL.iter().enumerate() {
            assert_eq!(control.set_mode(i).unwrap(), *expected);
            assert_eq!(control.selected_mode_index(), Some(i));
        }
    }

    #[test]
    fn test_mode_not_on_selector() {
        let control = ControlSurface::new(ModeSelector::OnOff, ComputeUnits::Automatic);
        control.set_processing_mode(ProcessingMode::Infer(ComputeUnits::CpuOnly));
        assert_eq!(control.selected_mode_index(), None);
    }

    #[test]
    fn test_style_setter_keeps_mode() {
        let control = ControlSurface::new(ModeSelector::Full, ComputeUnits::Automatic);
        control.set_mode(2).unwrap();
        assert_eq!(control.set_style(4), Ok(StyleId::Style5));

        let snapshot = control.snapshot();
        assert_eq!(snapshot.style, StyleId::Style5);
        assert_eq!(snapshot.mode, ProcessingMode::Infer(ComputeUnits::CpuAndAccelerator));

        assert_eq!(
            control.set_style(7),
            Err(ControlError::StyleIndexOutOfRange { index: 7, len: 7 })
        );
        assert_eq!(control.snapshot().style, StyleId::Style5);
    }

    #[test]
    fn test_clones_share_state() {
        let ui = ControlSurface::default();
        let worker = ui.clone();
        ui.set_style(6).unwrap();
        assert_eq!(worker.snapshot().style, StyleId::Style7);
    }

    #[test]
    fn test_concurrent_writes_never_tear() {
        let a = ControlSnapshot::new(ProcessingMode::PassThrough, StyleId::Style1);
        let b = ControlSnapshot::new(ProcessingMode::Infer(ComputeUnits::CpuOnly), StyleId::Style7);

        let control = ControlSurface::default();
        let stop = Arc::new(AtomicBool::new(false));

        let writer = {
            let control = control.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut flip = false;
                while !stop.load(Ordering::Relaxed) {
                    control.apply(if flip { a } else { b });
                    flip = !flip;
                }
            })
        };

        for _ in 0..100_000 {
            let seen = control.snapshot();
            assert!(seen == a || seen == b, "torn snapshot: {:?}", seen);
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
