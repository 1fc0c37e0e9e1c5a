//! Style Preview Library
//!
//! A live camera preview that can run every frame through one of seven
//! pre-trained style-transfer models before it is displayed.
//!
//! # Architecture
//!
//! ```text
//! capture → pipeline (drop late) → policy → (runner | raw conversion) → display
//!                                     ↑
//!                          control (atomic snapshot)
//! ```
//!
//! - **One frame in flight**: frames arriving while the worker is busy are
//!   dropped, never queued
//! - **Snapshot per frame**: mode and style are read together once, when
//!   processing of a frame starts
//! - **Best effort**: a frame whose model fails to load or run is simply
//!   not shown; the next frame is the retry
//!
//! # Example
//!
//! ```no_run
//! use style_preview::{
//!     capture::{Camera, CaptureConfig, MockCamera},
//!     control::{ComputeUnits, ControlSurface, ModeSelector},
//!     display,
//!     inference::SyntheticRunner,
//!     models::StyleRegistry,
//!     pipeline::Pipeline,
//!     policy::FramePolicy,
//! };
//!
//! let control = ControlSurface::new(ModeSelector::OnOff, ComputeUnits::Automatic);
//! let policy = FramePolicy::new(StyleRegistry::new("models"), SyntheticRunner::new(), 1);
//! let (sink, mut surface) = display::channel();
//! let pipeline = Pipeline::spawn(policy, control.clone(), sink).unwrap();
//!
//! let mut camera = MockCamera::new();
//! camera.open(&CaptureConfig::default()).unwrap();
//!
//! control.set_mode(1).unwrap();
//! control.set_style(2).unwrap();
//!
//! for _ in 0..10 {
//!     let frame = camera.capture().unwrap();
//!     pipeline.submit(&frame);
//!     surface.pump();
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod control;
pub mod display;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod policy;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, Frame, MockCamera, PixelFormat};
pub use config::FileConfig;
pub use control::{ComputeUnits, ControlSnapshot, ControlSurface, ProcessingMode, StyleId};
pub use display::{DisplayImage, DisplaySink, DisplaySurface};
pub use inference::{InferenceRunner, SyntheticRunner};
pub use models::StyleRegistry;
pub use pipeline::{CaptureLoop, Pipeline, Submission};
pub use policy::{FramePolicy, ProcessError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
