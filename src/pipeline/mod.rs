//! Threads that move frames from the camera to the display.
//!
//! ```text
//! camera-capture ──submit──► [busy?] ──► frame-worker ──deliver──► display
//!                               │
//!                               └── busy: frame dropped, never queued
//! ```

mod capture_loop;
mod worker;

pub use capture_loop::{CaptureLoop, CaptureSummary};
pub use worker::{FrameSubmitter, Pipeline, PipelineStats, StatsSnapshot, Submission};

use thiserror::Error;

/// Pipeline setup errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The named thread could not be started.
    #[error("failed to spawn {0} thread: {1}")]
    Spawn(&'static str, #[source] std::io::Error),
}
