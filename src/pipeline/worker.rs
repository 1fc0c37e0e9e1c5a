//! Frame worker with drop-late admission.
//!
//! At most one frame is ever in flight. A frame submitted while the
//! worker is busy is dropped on the spot; nothing queues up behind a slow
//! inference pass.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use super::PipelineError;
use crate::capture::Frame;
use crate::control::ControlSurface;
use crate::display::DisplaySink;
use crate::inference::InferenceRunner;
use crate::policy::{FramePolicy, ProcessError};

/// Outcome of offering a frame to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Copied and handed to the worker.
    Accepted,
    /// The worker was busy; the frame was never copied.
    DroppedLate,
    /// The worker has shut down.
    Closed,
}

/// Live counters shared by the submitter and the worker.
#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicU64,
    accepted: AtomicU64,
    dropped_late: AtomicU64,
    delivered: AtomicU64,
    model_unavailable: AtomicU64,
    inference_failed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames offered.
    pub submitted: u64,
    /// Frames handed to the worker.
    pub accepted: u64,
    /// Frames dropped while the worker was busy.
    pub dropped_late: u64,
    /// Images handed to the display sink.
    pub delivered: u64,
    pub model_unavailable: u64,
    /// Accepted frames whose inference produced no image.
    pub inference_failed: u64,
    /// Inference frames served by a cached model.
    pub cache_hits: u64,
    /// Inference frames that instantiated a model.
    pub cache_misses: u64,
}

impl StatsSnapshot {
    /// Accepted frames that produced no image.
    pub fn failed(&self) -> u64 {
        self.model_unavailable + self.inference_failed
    }
}

impl PipelineStats {
    /// Reads every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped_late: self.dropped_late.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            model_unavailable: self.model_unavailable.load(Ordering::Relaxed),
            inference_failed: self.inference_failed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable submitting half, used from the capture context.
#[derive(Clone)]
pub struct FrameSubmitter {
    tx: Sender<Frame>,
    busy: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
}

impl FrameSubmitter {
    /// Offers a frame. The frame is only copied if the worker is idle.
    pub fn submit(&self, frame: &Frame) -> Submission {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.stats.dropped_late.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(sequence = frame.sequence(), "Dropped late frame");
            return Submission::DroppedLate;
        }

        match self.tx.send(frame.clone()) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Submission::Accepted
            }
            Err(_) => {
                self.busy.store(false, Ordering::Release);
                Submission::Closed
            }
        }
    }

    /// True while a frame is being processed.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Counters shared with the worker.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Owns the frame worker thread.
pub struct Pipeline {
    submitter: FrameSubmitter,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Starts the worker. It reads `control` at the start of every frame
    /// and hands results to `sink`.
    pub fn spawn<R, S>(
        policy: FramePolicy<R>,
        control: ControlSurface,
        sink: S,
    ) -> Result<Self, PipelineError>
    where
        R: InferenceRunner + Send + 'static,
        R::Model: Send,
        S: DisplaySink + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded::<Frame>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let busy = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(PipelineStats::default());

        let worker = Worker {
            policy,
            control,
            sink,
            busy: busy.clone(),
            stats: stats.clone(),
        };

        let handle = std::thread::Builder::new()
            .name("frame-worker".to_string())
            .spawn(move || worker.run(rx, shutdown_rx))
            .map_err(|e| PipelineError::Spawn("frame-worker", e))?;

        Ok(Self {
            submitter: FrameSubmitter { tx, busy, stats },
            shutdown: Some(shutdown_tx),
            worker: Some(handle),
        })
    }

    /// Returns a handle for the capture context.
    pub fn submitter(&self) -> FrameSubmitter {
        self.submitter.clone()
    }

    /// Offers a frame; see [`FrameSubmitter::submit`].
    pub fn submit(&self, frame: &Frame) -> Submission {
        self.submitter.submit(frame)
    }

    /// True while a frame is being processed.
    pub fn is_busy(&self) -> bool {
        self.submitter.is_busy()
    }

    /// Current pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.submitter.stats()
    }

    /// Stops the worker once every accepted frame has been handled.
    pub fn shutdown(&mut self) {
        // Dropping the sender disconnects the worker's shutdown receiver.
        self.shutdown = None;
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Frame worker panicked");
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker<R: InferenceRunner, S> {
    policy: FramePolicy<R>,
    control: ControlSurface,
    sink: S,
    busy: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
}

impl<R: InferenceRunner, S: DisplaySink> Worker<R, S> {
    fn run(mut self, frames: Receiver<Frame>, shutdown: Receiver<()>) {
        tracing::info!("Frame worker started");

        loop {
            crossbeam_channel::select! {
                recv(frames) -> msg => match msg {
                    Ok(frame) => self.handle(frame),
                    Err(_) => break,
                },
                recv(shutdown) -> _ => {
                    // an accepted frame may be waiting; it still gets its image
                    if let Ok(frame) = frames.try_recv() {
                        self.handle(frame);
                    }
                    break;
                }
            }
        }

        tracing::info!("Frame worker stopped");
    }

    fn handle(&mut self, frame: Frame) {
        let snapshot = self.control.snapshot();
        let result = self.policy.process(&frame, snapshot);

        let cache = self.policy.cache_stats();
        self.stats.cache_hits.store(cache.hits, Ordering::Relaxed);
        self.stats.cache_misses.store(cache.misses, Ordering::Relaxed);

        match result {
            Ok(image) => {
                tracing::trace!(sequence = image.sequence(), applied = ?image.applied(), "Delivering image");
                self.sink.deliver(image);
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                let counter = match e {
                    ProcessError::ModelUnavailable { .. } => &self.stats.model_unavailable,
                    ProcessError::InferenceFailed { .. } => &self.stats.inference_failed,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(sequence = frame.sequence(), "Frame dropped: {}", e);
            }
        }

        self.busy.store(false, Ordering::Release);
    }
}
