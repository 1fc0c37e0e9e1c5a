//! Prometheus metrics for the preview pipeline.
//!
//! # Metrics Exposed
//!
//! ## Frame flow
//! - `style_preview_frames_submitted_total` - Frames offered to the worker
//! - `style_preview_frames_accepted_total` - Frames taken by an idle worker
//! - `style_preview_frames_dropped_late_total` - Frames dropped while the worker was busy
//! - `style_preview_frames_delivered_total` - Images handed to the display sink
//!
//! ## Dropped after acceptance
//! - `style_preview_model_unavailable_total` - Model could not be instantiated
//! - `style_preview_inference_failed_total` - Model produced no usable output
//!
//! ## Model cache
//! - `style_preview_model_cache_hits_total`
//! - `style_preview_model_cache_misses_total`
//!
//! ## Display
//! - `style_preview_worker_busy` - 1 while a frame is in flight
//! - `style_preview_images_shown_total` - Images that reached the screen
//! - `style_preview_images_stale_total` - Images discarded as older than the one shown
//!
//! # Example
//!
//! ```no_run
//! use style_preview::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot::default());
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
