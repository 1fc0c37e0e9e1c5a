//! Style Preview CLI
//!
//! Runs the capture → process → display loop headless and reports what
//! reached the screen. The display thread is this process's main thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use style_preview::{
    capture::MockCamera,
    config::{ConfigError, FileConfig},
    control::{ControlError, ControlSurface, ModeSelector, StyleId},
    display::{self, Applied},
    inference::{InferenceRunner, SyntheticRunner},
    metrics::{MetricsError, MetricsRegistry, MetricsSnapshot},
    models::StyleRegistry,
    pipeline::{CaptureLoop, Pipeline, PipelineError},
    policy::FramePolicy,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("built without the `{0}` feature")]
    FeatureDisabled(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    /// Synthetic gradient frames
    Mock,
    /// Native webcam
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RunnerArg {
    /// Deterministic tint per style
    Synthetic,
    /// ONNX Runtime models
    Onnx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SelectorArg {
    OnOff,
    Full,
}

#[derive(Debug, Parser)]
#[command(name = "style-preview", version, about = "Live camera preview with neural style transfer")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to capture before stopping
    #[arg(long)]
    frames: Option<u64>,

    /// Run until Ctrl-C
    #[arg(long)]
    continuous: bool,

    /// Mode selector index to start with
    #[arg(long)]
    mode: Option<usize>,

    /// Style selector index to start with (0-6)
    #[arg(long)]
    style: Option<usize>,

    /// Layout of the mode selector
    #[arg(long, value_enum)]
    mode_selector: Option<SelectorArg>,

    /// Directory holding style1.onnx .. style7.onnx
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Advance the style every N milliseconds
    #[arg(long, value_name = "MS")]
    cycle_styles: Option<u64>,

    #[arg(long, value_enum, default_value_t = SourceArg::Mock)]
    source: SourceArg,

    #[arg(long, value_enum, default_value_t = RunnerArg::Synthetic)]
    runner: RunnerArg,
}

impl Args {
    fn load_config(&self) -> Result<FileConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        if let Some(frames) = self.frames {
            config.output.frame_count = frames;
        }
        if self.continuous {
            config.output.continuous = true;
        }
        if let Some(mode) = self.mode {
            config.output.initial_mode = mode;
        }
        if let Some(style) = self.style {
            config.output.initial_style = style;
        }
        if let Some(selector) = self.mode_selector {
            config.inference.mode_selector = match selector {
                SelectorArg::OnOff => ModeSelector::OnOff,
                SelectorArg::Full => ModeSelector::Full,
            };
        }
        if let Some(dir) = &self.models_dir {
            config.inference.models_dir = Some(dir.clone());
        }
        if let Some(ms) = self.cycle_styles {
            config.output.cycle_styles_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Style Preview v{}", style_preview::VERSION);

    if let Err(e) = try_main(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn try_main(args: Args) -> Result<(), AppError> {
    let config = args.load_config()?;

    let control = ControlSurface::new(config.inference.mode_selector, config.inference.on_units);
    let mode = control.set_mode(config.output.initial_mode)?;
    let style = control.set_style(config.output.initial_style)?;
    info!(%mode, %style, "Initial selection");

    let registry = match &config.inference.models_dir {
        Some(dir) => StyleRegistry::new(dir),
        None => StyleRegistry::discover().unwrap_or_else(|e| {
            warn!("{}; using ./models", e);
            StyleRegistry::new("models")
        }),
    };

    match args.runner {
        RunnerArg::Synthetic => run(SyntheticRunner::new(), registry, control, &config, args.source),
        #[cfg(feature = "onnx")]
        RunnerArg::Onnx => {
            let missing = registry.missing_artifacts();
            if !missing.is_empty() {
                warn!(
                    "Missing style models in {:?}: {:?}; those styles will show nothing",
                    registry.root(),
                    missing
                );
            }
            let runner = style_preview::inference::OnnxRunner::new(config.inference.input_edge);
            run(runner, registry, control, &config, args.source)
        }
        #[cfg(not(feature = "onnx"))]
        RunnerArg::Onnx => Err(AppError::FeatureDisabled("onnx")),
    }
}

fn run<R>(
    runner: R,
    registry: StyleRegistry,
    control: ControlSurface,
    config: &FileConfig,
    source: SourceArg,
) -> Result<(), AppError>
where
    R: InferenceRunner + Send + 'static,
    R::Model: Send,
{
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::Release))?;
    }

    let policy = FramePolicy::new(registry, runner, config.inference.cache_capacity);
    let (sink, mut surface) = display::channel();
    let mut pipeline = Pipeline::spawn(policy, control.clone(), sink)?;

    let max_frames = (!config.output.continuous).then_some(config.output.frame_count);
    let mut capture = match source {
        SourceArg::Mock => CaptureLoop::spawn(
            MockCamera::new,
            config.capture.clone(),
            pipeline.submitter(),
            max_frames,
        )?,
        #[cfg(feature = "camera")]
        SourceArg::Camera => CaptureLoop::spawn(
            style_preview::capture::DeviceCamera::new,
            config.capture.clone(),
            pipeline.submitter(),
            max_frames,
        )?,
        #[cfg(not(feature = "camera"))]
        SourceArg::Camera => return Err(AppError::FeatureDisabled("camera")),
    };

    let cycler = spawn_style_cycler(&control, config.output.cycle_styles_ms, interrupted.clone());

    // Display loop
    while capture.is_running() && !interrupted.load(Ordering::Acquire) {
        if surface.wait_for_update(Duration::from_millis(100)) {
            if let Some(image) = surface.current() {
                let label = match image.applied() {
                    Applied::PassThrough => "raw".to_string(),
                    Applied::Styled { style, units } => format!("{} ({})", style, units.label()),
                };
                debug!(
                    sequence = image.sequence(),
                    width = image.width(),
                    height = image.height(),
                    latency_ms = image.captured_at().elapsed().as_millis() as u64,
                    "Showing {}",
                    label
                );
            }
        }
    }

    interrupted.store(true, Ordering::Release);
    let summary = capture.stop();
    pipeline.shutdown();
    surface.pump();
    if let Some(handle) = cycler {
        join_logged("style-cycler", handle);
    }

    let stats = pipeline.stats();
    info!(
        "Captured {} frames: {} accepted, {} dropped late, {} shown, {} failed",
        summary.captured,
        stats.accepted,
        stats.dropped_late,
        surface.shown(),
        stats.failed()
    );
    if !summary.configured {
        warn!("Capture session was never configured; nothing was previewed");
    }

    let metrics = MetricsRegistry::new()?;
    metrics.update(&MetricsSnapshot {
        pipeline: stats,
        worker_busy: pipeline.is_busy(),
        images_shown: surface.shown(),
        images_stale: surface.stale(),
    });
    println!("{}", metrics.encode()?);

    Ok(())
}

/// Advances the style on its own thread, standing in for a user tapping
/// the style control while frames are in flight.
fn spawn_style_cycler(
    control: &ControlSurface,
    period_ms: u64,
    stop: Arc<AtomicBool>,
) -> Option<std::thread::JoinHandle<()>> {
    if period_ms == 0 {
        return None;
    }
    let control = control.clone();
    let spawned = std::thread::Builder::new()
        .name("style-cycler".to_string())
        .spawn(move || {
            let period = Duration::from_millis(period_ms);
            while !stop.load(Ordering::Acquire) {
                std::thread::sleep(period);
                let next = (control.snapshot().style.index() + 1) % StyleId::ALL.len();
                if let Ok(style) = control.set_style(next) {
                    info!(%style, "Style changed");
                }
            }
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to spawn style cycler: {}", e);
            None
        }
    }
}

/// Joins a helper thread, logging a panic instead of discarding it.
/// Returns false if the thread panicked.
fn join_logged(name: &str, handle: std::thread::JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            error!("{} thread panicked", name);
            false
        }
    }
}
