//! Per-frame processing decision.
//!
//! Every frame is handled under exactly one [`ControlSnapshot`]: either
//! converted as-is for display, or run through the selected style model
//! with the selected compute preference.
//!
//! ```text
//! PassThrough ──────────────────────────────► convert ─► DisplayImage
//! Infer(units) ─► resolve ─► cache/instantiate ─► run ─► convert ─► DisplayImage
//!                                 │                │
//!                          ModelUnavailable   InferenceFailed   (frame dropped)
//! ```

use thiserror::Error;

use crate::capture::Frame;
use crate::control::{ComputeUnits, ControlSnapshot, ProcessingMode, StyleId};
use crate::display::{to_rgba_image, Applied, DisplayImage};
use crate::inference::{InferenceError, InferenceRunner};
use crate::models::{CacheStats, ModelCache, ModelKey, StyleRegistry};

/// Why a frame produced no image.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The model could not be instantiated.
    #[error("model {style} ({units:?}) unavailable: {source}")]
    ModelUnavailable {
        /// Style that was selected.
        style: StyleId,
        /// Preference that was selected.
        units: ComputeUnits,
        /// Runner error.
        #[source]
        source: InferenceError,
    },
    /// The model ran but produced no usable image.
    #[error("inference with {style} ({units:?}) failed: {source}")]
    InferenceFailed {
        /// Style that was selected.
        style: StyleId,
        /// Preference that was selected.
        units: ComputeUnits,
        /// Runner error.
        #[source]
        source: InferenceError,
    },
}

/// Turns frames into displayable images.
pub struct FramePolicy<R: InferenceRunner> {
    registry: StyleRegistry,
    runner: R,
    cache: ModelCache<R::Model>,
}

impl<R: InferenceRunner> FramePolicy<R> {
    /// Creates a policy caching up to `cache_capacity` instantiated models.
    pub fn new(registry: StyleRegistry, runner: R, cache_capacity: usize) -> Self {
        Self {
            registry,
            runner,
            cache: ModelCache::new(cache_capacity),
        }
    }

    /// Processes one frame under `snapshot`.
    ///
    /// The returned image records `snapshot`; errors mean the frame is
    /// dropped and leave nothing behind that affects the next frame.
    pub fn process(
        &mut self,
        frame: &Frame,
        snapshot: ControlSnapshot,
    ) -> Result<DisplayImage, ProcessError> {
        match snapshot.mode {
            ProcessingMode::PassThrough => Ok(Self::pass_through(frame)),
            ProcessingMode::Infer(units) => self.stylize(frame, snapshot.style, units),
        }
    }

    fn pass_through(frame: &Frame) -> DisplayImage {
        let image = to_rgba_image(frame.pixels(), frame.width(), frame.height(), frame.format());
        DisplayImage::new(image, frame.sequence(), Applied::PassThrough, frame.timestamp())
    }

    fn stylize(
        &mut self,
        frame: &Frame,
        style: StyleId,
        units: ComputeUnits,
    ) -> Result<DisplayImage, ProcessError> {
        let descriptor = self.registry.resolve(style);
        let runner = &self.runner;

        let model = self
            .cache
            .get_or_try_insert_with(ModelKey::new(style, units), || {
                runner.instantiate(descriptor, units)
            })
            .map_err(|source| ProcessError::ModelUnavailable {
                style,
                units,
                source,
            })?;

        let output = runner
            .run(model, frame)
            .map_err(|source| ProcessError::InferenceFailed {
                style,
                units,
                source,
            })?;

        tracing::trace!(
            sequence = frame.sequence(),
            %style,
            width = output.width(),
            height = output.height(),
            "Stylized frame"
        );

        let image = to_rgba_image(output.pixels(), output.width(), output.height(), output.format());
        Ok(DisplayImage::new(
            image,
            frame.sequence(),
            Applied::Styled { style, units },
            frame.timestamp(),
        ))
    }

    /// Where models are looked up.
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// The runner models are instantiated with.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Hit and miss counts of the model cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of models currently instantiated.
    pub fn cached_models(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PixelFormat;
    use crate::inference::SyntheticRunner;

    fn policy(runner: SyntheticRunner) -> FramePolicy<SyntheticRunner> {
        FramePolicy::new(StyleRegistry::new("models"), runner, 1)
    }

    fn frame(sequence: u64) -> Frame {
        let pixels: Vec<u8> = (0..4 * 3 * 4).map(|i| i as u8).collect();
        Frame::new(pixels, 4, 3, PixelFormat::Bgra8, sequence).unwrap()
    }

    fn infer(style: StyleId, units: ComputeUnits) -> ControlSnapshot {
        ControlSnapshot::new(ProcessingMode::Infer(units), style)
    }

    #[test]
    fn test_pass_through_is_lossless() {
        let runner = SyntheticRunner::new();
        let mut policy = policy(runner.clone());
        let frame = frame(1);

        let snapshot = ControlSnapshot::new(ProcessingMode::PassThrough, StyleId::Style4);
        let image = policy.process(&frame, snapshot).unwrap();

        assert_eq!(image.applied(), Applied::PassThrough);
        assert_eq!((image.width(), image.height()), (4, 3));
        for (i, pixel) in image.image().pixels().enumerate() {
            assert_eq!(pixel.0, frame.rgba_at(i));
        }
        // style is irrelevant and no model is touched
        assert_eq!(runner.instantiation_count(), 0);
        assert_eq!(runner.run_count(), 0);
    }

    #[test]
    fn test_infer_applies_selected_style() {
        let runner = SyntheticRunner::new();
        let mut policy = policy(runner);
        let frame = frame(2);

        let image = policy
            .process(&frame, infer(StyleId::Style3, ComputeUnits::Automatic))
            .unwrap();

        assert_eq!(
            image.applied(),
            Applied::Styled {
                style: StyleId::Style3,
                units: ComputeUnits::Automatic
            }
        );
        assert_eq!(image.sequence(), 2);
        let [r, g, b, _] = frame.rgba_at(0);
        let expected = SyntheticRunner::stylize_pixel(StyleId::Style3, [r, g, b]);
        assert_eq!(&image.image().get_pixel(0, 0).0[..3], &expected);
    }

    #[test]
    fn test_model_reused_across_frames() {
        let runner = SyntheticRunner::new();
        let mut policy = policy(runner.clone());
        let snapshot = infer(StyleId::Style1, ComputeUnits::CpuOnly);

        for seq in 0..5 {
            policy.process(&frame(seq), snapshot).unwrap();
        }

        assert_eq!(runner.instantiation_count(), 1);
        assert_eq!(runner.run_count(), 5);
        assert_eq!(policy.cache_stats().hits, 4);
    }

    #[test]
    fn test_key_change_reinstantiates() {
        let runner = SyntheticRunner::new();
        let mut policy = policy(runner.clone());

        policy.process(&frame(1), infer(StyleId::Style1, ComputeUnits::Automatic)).unwrap();
        policy.process(&frame(2), infer(StyleId::Style1, ComputeUnits::CpuOnly)).unwrap();
        policy.process(&frame(3), infer(StyleId::Style2, ComputeUnits::CpuOnly)).unwrap();

        assert_eq!(runner.instantiation_count(), 3);
        assert_eq!(policy.cached_models(), 1);
    }

    #[test]
    fn test_missing_model_drops_frame_then_recovers() {
        let runner = SyntheticRunner::new();
        runner.set_missing(StyleId::Style5, true);
        let mut policy = policy(runner.clone());

        let err = policy
            .process(&frame(1), infer(StyleId::Style5, ComputeUnits::Automatic))
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessError::ModelUnavailable {
                style: StyleId::Style5,
                source: InferenceError::ArtifactMissing(_),
                ..
            }
        ));

        let image = policy
            .process(&frame(2), infer(StyleId::Style1, ComputeUnits::Automatic))
            .unwrap();
        assert_eq!(image.sequence(), 2);
    }

    #[test]
    fn test_failed_run_keeps_model() {
        let runner = SyntheticRunner::new();
        let mut policy = policy(runner.clone());
        let snapshot = infer(StyleId::Style2, ComputeUnits::Automatic);

        runner.set_fail_runs(true);
        let err = policy.process(&frame(1), snapshot).unwrap_err();
        assert!(matches!(err, ProcessError::InferenceFailed { .. }));

        runner.set_fail_runs(false);
        assert!(policy.process(&frame(2), snapshot).is_ok());
        assert_eq!(runner.instantiation_count(), 1);
    }

    #[test]
    fn test_unsupported_units_reported_as_unavailable() {
        let runner = SyntheticRunner::new();
        runner.set_unsupported(ComputeUnits::CpuAndAccelerator, true);
        let mut policy = policy(runner);

        let err = policy
            .process(&frame(1), infer(StyleId::Style1, ComputeUnits::CpuAndAccelerator))
            .unwrap_err();
        assert!(matches!(err, ProcessError::ModelUnavailable { .. }));
    }
}
