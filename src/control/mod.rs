//! User-facing selections: processing mode and style.
//!
//! The controls only ever hold values drawn from closed enumerations;
//! out-of-range selector indices are rejected here, never inside the
//! frame policy.

mod selection;
mod surface;

pub use selection::{ComputeUnits, ModeOption, ModeSelector, ProcessingMode, StyleId};
pub use surface::{ControlError, ControlSnapshot, ControlSurface};
