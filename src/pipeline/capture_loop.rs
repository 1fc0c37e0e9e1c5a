//! Producer context: pulls frames from a camera and offers them to the
//! worker at the configured rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::{FrameSubmitter, PipelineError, Submission};
use crate::capture::{Camera, CameraError, CaptureConfig};

const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// What the capture thread did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// False when the session could not be configured.
    pub configured: bool,
    /// Frames read from the camera.
    pub captured: u64,
    /// Reads that failed and were skipped.
    pub capture_errors: u64,
    /// Frames dropped because the worker was busy.
    pub dropped_late: u64,
}

/// Runs a camera on its own thread.
pub struct CaptureLoop {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<CaptureSummary>>,
}

impl CaptureLoop {
    /// Starts capturing. The camera is built on the capture thread by
    /// `make_camera`, so it does not need to be `Send`.
    ///
    /// Stops by itself after `max_frames` captured frames, if given.
    pub fn spawn<C, F>(
        make_camera: F,
        config: CaptureConfig,
        submitter: FrameSubmitter,
        max_frames: Option<u64>,
    ) -> Result<Self, PipelineError>
    where
        C: Camera,
        F: FnOnce() -> C + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                let mut camera = make_camera();
                let summary = capture_thread(&mut camera, &config, &submitter, &running_clone, max_frames);
                camera.close();
                running_clone.store(false, Ordering::Release);
                summary
            })
            .map_err(|e| PipelineError::Spawn("camera-capture", e))?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// True until the thread stops (on request, frame limit or failure).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Asks the thread to stop and waits for it.
    pub fn stop(&mut self) -> CaptureSummary {
        self.running.store(false, Ordering::Release);
        self.join()
    }

    /// Waits for the thread to finish on its own.
    pub fn join(&mut self) -> CaptureSummary {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) => {
                tracing::error!("Capture thread panicked");
                CaptureSummary::default()
            }
            None => CaptureSummary::default(),
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn capture_thread<C: Camera>(
    camera: &mut C,
    config: &CaptureConfig,
    submitter: &FrameSubmitter,
    running: &AtomicBool,
    max_frames: Option<u64>,
) -> CaptureSummary {
    let mut summary = CaptureSummary::default();

    if let Err(e) = camera.open(config) {
        if e.is_configuration_failure() {
            tracing::warn!("Capture session not configured, preview inactive: {}", e);
        } else {
            tracing::error!("Failed to open camera: {}", e);
        }
        return summary;
    }
    summary.configured = true;
    tracing::info!(fps = config.fps, "Camera capture thread started");

    let interval = Duration::from_secs(1) / config.fps.max(1);
    let mut next_frame_at = Instant::now();

    while running.load(Ordering::Acquire) {
        if max_frames.is_some_and(|max| summary.captured >= max) {
            break;
        }

        let now = Instant::now();
        if now < next_frame_at {
            std::thread::sleep(next_frame_at - now);
        }
        next_frame_at += interval;
        // reset if too far behind
        let now = Instant::now();
        if now > next_frame_at + interval * 2 {
            next_frame_at = now + interval;
        }

        match camera.capture() {
            Ok(frame) => {
                summary.captured += 1;
                if submitter.submit(&frame) == Submission::DroppedLate {
                    summary.dropped_late += 1;
                }
            }
            Err(CameraError::NotInitialized) => {
                tracing::error!("Camera closed underneath the capture loop");
                break;
            }
            Err(e) => {
                summary.capture_errors += 1;
                tracing::warn!("Failed to capture frame: {}", e);
                std::thread::sleep(CAPTURE_RETRY_DELAY);
            }
        }
    }

    tracing::info!(
        captured = summary.captured,
        dropped_late = summary.dropped_late,
        "Camera capture thread stopped"
    );
    summary
}
