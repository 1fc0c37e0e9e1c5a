//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

use crate::pipeline::StatsSnapshot;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of preview state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Pipeline counters.
    pub pipeline: StatsSnapshot,
    /// Whether a frame is currently in flight.
    pub worker_busy: bool,
    /// Images the display surface has shown.
    pub images_shown: u64,
    /// Images the display surface discarded as older than the one shown.
    pub images_stale: u64,
}

/// Prometheus metrics registry for the preview pipeline.
pub struct MetricsRegistry {
    registry: Registry,

    // Frame flow
    frames_submitted: IntCounter,
    frames_accepted: IntCounter,
    frames_dropped_late: IntCounter,
    frames_delivered: IntCounter,

    // Dropped after acceptance
    model_unavailable: IntCounter,
    inference_failed: IntCounter,

    // Model cache
    cache_hits: IntCounter,
    cache_misses: IntCounter,

    // Display
    worker_busy: IntGauge,
    images_shown: IntCounter,
    images_stale: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all preview metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_submitted = IntCounter::new(
            "style_preview_frames_submitted_total",
            "Frames offered to the frame worker",
        )?;
        let frames_accepted = IntCounter::new(
            "style_preview_frames_accepted_total",
            "Frames accepted by an idle frame worker",
        )?;
        let frames_dropped_late = IntCounter::new(
            "style_preview_frames_dropped_late_total",
            "Frames dropped because the worker was busy",
        )?;
        let frames_delivered = IntCounter::new(
            "style_preview_frames_delivered_total",
            "Images delivered to the display sink",
        )?;

        let model_unavailable = IntCounter::new(
            "style_preview_model_unavailable_total",
            "Frames dropped because the style model could not be instantiated",
        )?;
        let inference_failed = IntCounter::new(
            "style_preview_inference_failed_total",
            "Frames dropped because the model produced no usable output",
        )?;

        let cache_hits = IntCounter::new(
            "style_preview_model_cache_hits_total",
            "Inference frames served by an already instantiated model",
        )?;
        let cache_misses = IntCounter::new(
            "style_preview_model_cache_misses_total",
            "Inference frames that had to instantiate a model",
        )?;

        let worker_busy = IntGauge::new(
            "style_preview_worker_busy",
            "Whether a frame is in flight (1=busy, 0=idle)",
        )?;
        let images_shown = IntCounter::new(
            "style_preview_images_shown_total",
            "Images that reached the screen",
        )?;
        let images_stale = IntCounter::new(
            "style_preview_images_stale_total",
            "Images discarded for being older than the one on screen",
        )?;

        registry.register(Box::new(frames_submitted.clone()))?;
        registry.register(Box::new(frames_accepted.clone()))?;
        registry.register(Box::new(frames_dropped_late.clone()))?;
        registry.register(Box::new(frames_delivered.clone()))?;
        registry.register(Box::new(model_unavailable.clone()))?;
        registry.register(Box::new(inference_failed.clone()))?;
        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(cache_misses.clone()))?;
        registry.register(Box::new(worker_busy.clone()))?;
        registry.register(Box::new(images_shown.clone()))?;
        registry.register(Box::new(images_stale.clone()))?;

        Ok(Self {
            registry,
            frames_submitted,
            frames_accepted,
            frames_dropped_late,
            frames_delivered,
            model_unavailable,
            inference_failed,
            cache_hits,
            cache_misses,
            worker_busy,
            images_shown,
            images_stale,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        let p = &snapshot.pipeline;
        advance(&self.frames_submitted, p.submitted);
        advance(&self.frames_accepted, p.accepted);
        advance(&self.frames_dropped_late, p.dropped_late);
        advance(&self.frames_delivered, p.delivered);
        advance(&self.model_unavailable, p.model_unavailable);
        advance(&self.inference_failed, p.inference_failed);
        advance(&self.cache_hits, p.cache_hits);
        advance(&self.cache_misses, p.cache_misses);

        self.worker_busy.set(if snapshot.worker_busy { 1 } else { 0 });
        advance(&self.images_shown, snapshot.images_shown);
        advance(&self.images_stale, snapshot.images_stale);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

// Counters only move forward, so bump by the difference.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            pipeline: StatsSnapshot {
                submitted: 10,
                accepted: 1,
                dropped_late: 9,
                delivered: 1,
                ..Default::default()
            },
            worker_busy: true,
            images_shown: 1,
            images_stale: 0,
        };

        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("style_preview_frames_submitted_total 10"));
        assert!(output.contains("style_preview_frames_dropped_late_total 9"));
        assert!(output.contains("style_preview_worker_busy 1"));
    }

    #[test]
    fn test_counters_never_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();
        let mut snapshot = MetricsSnapshot::default();

        snapshot.pipeline.delivered = 5;
        registry.update(&snapshot);
        snapshot.pipeline.delivered = 3;
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("style_preview_frames_delivered_total 5"));
    }
}
