//! Style model execution.
//!
//! Runners are opaque: they turn a [`ModelDescriptor`] and a compute
//! preference into a model, and a model plus a frame into an output
//! buffer. Both calls can take tens to hundreds of milliseconds and are
//! only ever made from the frame worker thread.

#[cfg(feature = "onnx")]
mod onnx;
mod output;
mod synthetic;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxModel, OnnxRunner};
pub use output::OutputBuffer;
pub use synthetic::{SyntheticModel, SyntheticRunner};

use std::path::PathBuf;

use thiserror::Error;

use crate::capture::{Frame, FrameError};
use crate::control::ComputeUnits;
use crate::models::ModelDescriptor;

/// Errors raised by a runner.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The model file does not exist.
    #[error("model artifact missing: {0}")]
    ArtifactMissing(PathBuf),
    /// The host cannot honour the compute preference.
    #[error("compute units {0:?} not supported on this device")]
    UnsupportedComputeUnits(ComputeUnits),
    /// The runtime rejected the model.
    #[error("failed to load model: {0}")]
    Load(String),
    /// The inference pass failed.
    #[error("model execution failed: {0}")]
    Run(String),
    /// The model returned no tensors.
    #[error("model produced no output")]
    NoOutput,
    /// The output is not a `[1, 3, H, W]` image.
    #[error("unexpected output shape {0:?}")]
    UnexpectedShape(Vec<i64>),
    /// The output buffer does not match its dimensions.
    #[error("invalid output buffer: {0}")]
    InvalidOutput(#[from] FrameError),
}

/// Loads and executes style models.
pub trait InferenceRunner {
    /// An instantiated model bound to one style and one preference.
    type Model;

    /// Instantiates the model described by `descriptor` for `units`.
    fn instantiate(
        &self,
        descriptor: &ModelDescriptor,
        units: ComputeUnits,
    ) -> Result<Self::Model, InferenceError>;

    /// Runs one inference pass over `frame`.
    fn run(&self, model: &mut Self::Model, frame: &Frame) -> Result<OutputBuffer, InferenceError>;
}
