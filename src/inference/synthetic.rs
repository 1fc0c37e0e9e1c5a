//! Deterministic stand-in for real style models.
//!
//! Each style blends the frame towards a fixed tint. Faults can be
//! injected at runtime through any clone of the runner, which makes it
//! useful for exercising the dropped-frame paths.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{InferenceError, InferenceRunner, OutputBuffer};
use crate::capture::{Frame, PixelFormat};
use crate::control::{ComputeUnits, StyleId};
use crate::models::ModelDescriptor;

const STYLE_TINTS: [[u8; 3]; 7] = [
    [230, 120, 40],
    [40, 90, 200],
    [250, 210, 60],
    [120, 40, 160],
    [30, 160, 90],
    [200, 30, 60],
    [90, 90, 90],
];

#[derive(Debug, Default)]
struct State {
    missing: HashSet<StyleId>,
    unsupported: HashSet<ComputeUnits>,
    fail_runs: bool,
    latency: Duration,
    instantiations: u64,
    runs: u64,
}

/// Instantiated synthetic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticModel {
    /// Style the model tints towards.
    pub style: StyleId,
    /// Preference it was instantiated with.
    pub units: ComputeUnits,
}

/// Runner producing tinted frames.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRunner {
    state: Arc<Mutex<State>>,
}

impl SyntheticRunner {
    /// Creates a runner with no faults and no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fixed delay to every run.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = latency;
        self
    }

    /// Marks a style's artifact as missing (or present again).
    pub fn set_missing(&self, style: StyleId, missing: bool) {
        let mut state = self.state.lock();
        if missing {
            state.missing.insert(style);
        } else {
            state.missing.remove(&style);
        }
    }

    /// Marks a compute preference as unsupported on this "device".
    pub fn set_unsupported(&self, units: ComputeUnits, unsupported: bool) {
        let mut state = self.state.lock();
        if unsupported {
            state.unsupported.insert(units);
        } else {
            state.unsupported.remove(&units);
        }
    }

    /// Makes every run return no output.
    pub fn set_fail_runs(&self, fail: bool) {
        self.state.lock().fail_runs = fail;
    }

    /// Successful `instantiate` calls so far.
    pub fn instantiation_count(&self) -> u64 {
        self.state.lock().instantiations
    }

    /// `run` calls so far, failed ones included.
    pub fn run_count(&self) -> u64 {
        self.state.lock().runs
    }

    /// Expected colour of `rgb` after styling with `style`.
    pub fn stylize_pixel(style: StyleId, rgb: [u8; 3]) -> [u8; 3] {
        let tint = STYLE_TINTS[style.index()];
        [
            ((rgb[0] as u16 + tint[0] as u16) / 2) as u8,
            ((rgb[1] as u16 + tint[1] as u16) / 2) as u8,
            ((rgb[2] as u16 + tint[2] as u16) / 2) as u8,
        ]
    }
}

impl InferenceRunner for SyntheticRunner {
    type Model = SyntheticModel;

    fn instantiate(
        &self,
        descriptor: &ModelDescriptor,
        units: ComputeUnits,
    ) -> Result<SyntheticModel, InferenceError> {
        let mut state = self.state.lock();
        if state.missing.contains(&descriptor.style) {
            return Err(InferenceError::ArtifactMissing(descriptor.path.clone()));
        }
        if state.unsupported.contains(&units) {
            return Err(InferenceError::UnsupportedComputeUnits(units));
        }
        state.instantiations += 1;
        tracing::debug!(style = %descriptor.style, ?units, "Instantiated synthetic model");
        Ok(SyntheticModel {
            style: descriptor.style,
            units,
        })
    }

    fn run(&self, model: &mut SyntheticModel, frame: &Frame) -> Result<OutputBuffer, InferenceError> {
        let (latency, fail) = {
            let mut state = self.state.lock();
            state.runs += 1;
            (state.latency, state.fail_runs)
        };
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        if fail {
            return Err(InferenceError::NoOutput);
        }

        let mut pixels = Vec::with_capacity(frame.pixel_count() * 3);
        for i in 0..frame.pixel_count() {
            let [r, g, b, _] = frame.rgba_at(i);
            pixels.extend_from_slice(&Self::stylize_pixel(model.style, [r, g, b]));
        }
        Ok(OutputBuffer::new(
            pixels,
            frame.width(),
            frame.height(),
            PixelFormat::Rgb8,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StyleRegistry;

    fn frame() -> Frame {
        Frame::new(vec![0, 0, 0, 255, 255, 255, 255, 255], 2, 1, PixelFormat::Bgra8, 1).unwrap()
    }

    #[test]
    fn test_run_tints_frame() {
        let runner = SyntheticRunner::new();
        let registry = StyleRegistry::new("models");
        let mut model = runner
            .instantiate(registry.resolve(StyleId::Style3), ComputeUnits::Automatic)
            .unwrap();

        let out = runner.run(&mut model, &frame()).unwrap();

        assert_eq!((out.width(), out.height()), (2, 1));
        assert_eq!(out.format(), PixelFormat::Rgb8);
        assert_eq!(&out.pixels()[..3], &[125, 105, 30]);
        assert_eq!(runner.run_count(), 1);
    }

    #[test]
    fn test_missing_artifact() {
        let runner = SyntheticRunner::new();
        runner.set_missing(StyleId::Style5, true);
        let registry = StyleRegistry::new("models");

        let err = runner
            .instantiate(registry.resolve(StyleId::Style5), ComputeUnits::Automatic)
            .unwrap_err();
        assert!(matches!(err, InferenceError::ArtifactMissing(_)));
        assert_eq!(runner.instantiation_count(), 0);
    }

    #[test]
    fn test_unsupported_units() {
        let runner = SyntheticRunner::new();
        runner.set_unsupported(ComputeUnits::CpuAndAccelerator, true);
        let registry = StyleRegistry::new("models");

        let err = runner
            .instantiate(registry.resolve(StyleId::Style1), ComputeUnits::CpuAndAccelerator)
            .unwrap_err();
        assert!(matches!(
            err,
            InferenceError::UnsupportedComputeUnits(ComputeUnits::CpuAndAccelerator)
        ));
    }

    #[test]
    fn test_failing_runs() {
        let runner = SyntheticRunner::new();
        let mut model = SyntheticModel {
            style: StyleId::Style1,
            units: ComputeUnits::CpuOnly,
        };
        runner.set_fail_runs(true);
        assert!(matches!(runner.run(&mut model, &frame()), Err(InferenceError::NoOutput)));
    }
}
