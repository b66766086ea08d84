// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session — the frame-processing loop behind the camera preview.
//
// Frames are submitted from the capture callback and handed to a single
// worker task through a one-frame slot: a newer frame replaces one the worker
// has not reached yet. For each frame the worker
//
//   1. runs the rectangle detector on the blocking pool, bounded by the
//      configured frame budget; while an overrunning call is still busy,
//      new frames are dropped rather than starting a second one,
//   2. classifies the detection and publishes `FrameGuidance`,
//   3. if a capture was requested and something was detected, rectifies the
//      frame and publishes the `Capture`.
//
// Guidance and captures are published on `tokio::sync::watch` channels, so
// readers always see the latest value and never block the worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use autocrop_bridge::{OverlayRenderer, RectangleDetector};
use autocrop_core::error::{AutoCropError, Result};
use autocrop_core::{AutoCropConfig, ClassificationResult, Detection, FrameGuidance, Quadrilateral};
use autocrop_vision::{RectifiedImage, classify, frame, rectify};
use image::RgbaImage;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::stats::{SessionStats, StatsSnapshot};
use crate::trigger::CaptureTrigger;

// ---------------------------------------------------------------------------
// Frames and captures
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Frame {
    sequence: u64,
    image: Arc<RgbaImage>,
}

/// A rectified capture and the frame it was taken from.
#[derive(Debug)]
pub struct Capture {
    pub sequence: u64,
    pub rectified: RectifiedImage,
}

/// One-frame queue between the producer and the worker.
#[derive(Debug, Default)]
struct FrameSlot {
    frame: Mutex<Option<Frame>>,
    ready: Notify,
}

impl FrameSlot {
    /// Store `frame`, returning the sequence number of any frame it displaced.
    fn put(&self, frame: Frame) -> Option<u64> {
        let displaced = self
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame);
        self.ready.notify_one();
        displaced.map(|f| f.sequence)
    }

    fn take(&self) -> Option<Frame> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

// ---------------------------------------------------------------------------
// ScanSession
// ---------------------------------------------------------------------------

/// A running frame-processing session.
///
/// Created with [`ScanSession::start`], which spawns the worker on the
/// current Tokio runtime. Call [`stop`](Self::stop) for a graceful shutdown;
/// dropping a running session signals the worker to exit without waiting.
pub struct ScanSession {
    config: AutoCropConfig,
    slot: Arc<FrameSlot>,
    trigger: CaptureTrigger,
    stats: Arc<SessionStats>,
    next_sequence: AtomicU64,
    guidance_rx: watch::Receiver<Option<FrameGuidance>>,
    capture_rx: watch::Receiver<Option<Arc<Capture>>>,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the worker task.
    task_handle: Option<JoinHandle<()>>,
    /// Tasks forwarding published values to attached renderers.
    renderer_tasks: Vec<JoinHandle<()>>,
}

impl ScanSession {
    /// Validate `config` and spawn the frame worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(detector: Arc<dyn RectangleDetector>, config: AutoCropConfig) -> Result<Self> {
        config.validate()?;

        let (guidance_tx, guidance_rx) = watch::channel(None);
        let (capture_tx, capture_rx) = watch::channel(None);
        let slot = Arc::new(FrameSlot::default());
        let trigger = CaptureTrigger::new();
        let stats = Arc::new(SessionStats::default());
        let shutdown_signal = Arc::new(Notify::new());

        info!(
            detector = detector.name(),
            frame_budget_ms = config.session.frame_budget_ms,
            "Scan session started"
        );

        let worker = Worker {
            detector,
            config: config.clone(),
            slot: Arc::clone(&slot),
            trigger: trigger.clone(),
            stats: Arc::clone(&stats),
            guidance_tx,
            capture_tx,
            overrun: None,
        };
        let handle = tokio::spawn(worker.run(Arc::clone(&shutdown_signal)));

        Ok(Self {
            config,
            slot,
            trigger,
            stats,
            next_sequence: AtomicU64::new(0),
            guidance_rx,
            capture_rx,
            shutdown_signal,
            task_handle: Some(handle),
            renderer_tasks: Vec::new(),
        })
    }

    pub fn config(&self) -> &AutoCropConfig {
        &self.config
    }

    /// Whether the worker is still accepting frames.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Queue a frame for processing and return its sequence number.
    ///
    /// Replaces any frame the worker has not started on yet.
    pub fn submit_frame(&self, image: RgbaImage) -> Result<u64> {
        if !self.is_running() {
            return Err(AutoCropError::SessionClosed);
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.stats.record_submitted();
        let frame = Frame {
            sequence,
            image: Arc::new(image),
        };
        if let Some(stale) = self.slot.put(frame) {
            self.stats.record_dropped_stale();
            debug!(stale, sequence, "Unprocessed frame replaced");
        }
        Ok(sequence)
    }

    /// Convert a BGRA camera buffer and queue it. See [`frame::from_bgra`].
    pub fn submit_bgra(
        &self,
        width: u32,
        height: u32,
        bytes_per_row: usize,
        data: &[u8],
    ) -> Result<u64> {
        let image = frame::from_bgra(width, height, bytes_per_row, data)?;
        self.submit_frame(image)
    }

    /// The capture flag shared with the UI.
    pub fn trigger(&self) -> &CaptureTrigger {
        &self.trigger
    }

    /// Shorthand for `trigger().request()`.
    pub fn request_capture(&self) {
        self.trigger.request();
    }

    /// Receiver for the latest guidance. `None` until the first frame has
    /// been classified.
    pub fn guidance(&self) -> watch::Receiver<Option<FrameGuidance>> {
        self.guidance_rx.clone()
    }

    /// Current guidance without waiting.
    pub fn latest_guidance(&self) -> Option<FrameGuidance> {
        self.guidance_rx.borrow().clone()
    }

    /// Receiver for the latest successful capture.
    pub fn captures(&self) -> watch::Receiver<Option<Arc<Capture>>> {
        self.capture_rx.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Forward every guidance update and capture to `renderer` until the
    /// session stops.
    ///
    /// A renderer attached mid-session immediately receives the current
    /// guidance and capture, if any.
    pub fn attach_renderer(&mut self, renderer: Arc<dyn OverlayRenderer>) -> Result<()> {
        if !self.is_running() {
            return Err(AutoCropError::SessionClosed);
        }

        let mut guidance = self.guidance_rx.clone();
        let mut captures = self.capture_rx.clone();
        let handle = tokio::spawn(async move {
            let (mut guidance_open, mut captures_open) = (true, true);
            while guidance_open || captures_open {
                tokio::select! {
                    changed = guidance.changed(), if guidance_open => match changed {
                        Ok(()) => {
                            let latest = guidance.borrow_and_update().clone();
                            if let Some(latest) = latest {
                                renderer.show_guidance(&latest);
                            }
                        }
                        Err(_) => guidance_open = false,
                    },
                    changed = captures.changed(), if captures_open => match changed {
                        Ok(()) => {
                            let latest = captures.borrow_and_update().clone();
                            if let Some(capture) = latest {
                                renderer.show_capture(capture.sequence, capture.rectified.image());
                            }
                        }
                        Err(_) => captures_open = false,
                    },
                }
            }
            debug!("Renderer detached");
        });
        self.renderer_tasks.push(handle);
        Ok(())
    }

    /// Gracefully stop the session.
    ///
    /// Signals the worker to exit after the frame it is working on, waits for
    /// it and for attached renderers to drain, and returns the final
    /// counters. Stopping a stopped session is a no-op.
    pub async fn stop(&mut self) -> StatsSnapshot {
        if let Some(handle) = self.task_handle.take() {
            info!("Stopping scan session");
            self.shutdown_signal.notify_one();
            if let Err(e) = handle.await {
                warn!(error = %e, "Frame worker ended abnormally");
            }
        }

        for handle in self.renderer_tasks.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Renderer task ended abnormally");
            }
        }

        let stats = self.stats.snapshot();
        info!(
            processed = stats.processed,
            dropped_stale = stats.dropped_stale,
            over_budget = stats.over_budget,
            captures = stats.captures_completed,
            "Scan session stopped"
        );
        stats
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            self.shutdown_signal.notify_one();
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// State owned by the worker task. It is the only writer of guidance and
/// captures, and the only consumer of the capture trigger.
struct Worker {
    detector: Arc<dyn RectangleDetector>,
    config: AutoCropConfig,
    slot: Arc<FrameSlot>,
    trigger: CaptureTrigger,
    stats: Arc<SessionStats>,
    guidance_tx: watch::Sender<Option<FrameGuidance>>,
    capture_tx: watch::Sender<Option<Arc<Capture>>>,
    /// Detector call that overran its budget and may still be running. Its
    /// result is discarded.
    overrun: Option<JoinHandle<Result<Option<Detection>>>>,
}

impl Worker {
    /// Process frames until the shutdown signal is received.
    async fn run(mut self, shutdown: Arc<Notify>) {
        loop {
            let frame = tokio::select! {
                _ = shutdown.notified() => {
                    debug!("Frame worker received shutdown signal");
                    break;
                }
                _ = self.slot.ready.notified() => self.slot.take(),
            };
            if let Some(frame) = frame {
                self.process(frame).await;
            }
        }
    }

    #[instrument(skip_all, fields(sequence = frame.sequence, detector = self.detector.name()))]
    async fn process(&mut self, frame: Frame) {
        // At most one detector call at a time.
        if self.overrun.as_ref().is_some_and(|job| !job.is_finished()) {
            self.stats.record_over_budget();
            debug!("Previous detection still running, frame dropped");
            return;
        }
        self.overrun = None;

        let started = Instant::now();
        let budget = self.config.session.frame_budget();

        let detector = Arc::clone(&self.detector);
        let image = Arc::clone(&frame.image);
        let mut job = tokio::task::spawn_blocking(move || detector.detect(&image));

        let detection = match tokio::time::timeout(budget, &mut job).await {
            Err(_) => {
                self.stats.record_over_budget();
                warn!(
                    budget_ms = self.config.session.frame_budget_ms,
                    "Detection overran the frame budget, frame dropped"
                );
                self.overrun = Some(job);
                return;
            }
            Ok(Err(join_err)) => {
                self.stats.record_detection_failure();
                warn!(error = %join_err, "Detector task failed");
                None
            }
            Ok(Ok(Err(err))) => {
                self.stats.record_detection_failure();
                warn!(error = %err, "Detection failed");
                None
            }
            Ok(Ok(Ok(detection))) => detection,
        };

        let quad = detection.map(|d| d.quad);
        let result = classify(quad.as_ref(), &self.config.classifier);
        let detected = result.has_detection();
        let bounds = if detected {
            quad.map(|q| q.bounding_box())
        } else {
            None
        };

        debug!(
            state = %result.state,
            confidence = ?detection.map(|d| d.confidence),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Frame classified"
        );
        self.guidance_tx.send_replace(Some(FrameGuidance {
            sequence: frame.sequence,
            result,
            bounds,
        }));
        self.stats.record_processed();

        // The trigger is only consumed on frames that have something to crop.
        if !detected || !self.trigger.take() {
            return;
        }
        if let Some(quad) = quad {
            self.capture(frame, quad).await;
        }
    }

    async fn capture(&self, frame: Frame, quad: Quadrilateral) {
        let sequence = frame.sequence;
        let image = frame.image;
        let job = tokio::task::spawn_blocking(move || rectify(&quad, &image));

        let outcome = job.await.unwrap_or_else(|join_err| {
            Err(AutoCropError::ImageError(format!(
                "rectification task failed: {join_err}"
            )))
        });

        match outcome {
            Ok(rectified) => {
                self.stats.record_capture(true);
                info!(
                    sequence,
                    width = rectified.width(),
                    height = rectified.height(),
                    "Capture rectified"
                );
                self.capture_tx
                    .send_replace(Some(Arc::new(Capture { sequence, rectified })));
            }
            Err(err) => {
                self.stats.record_capture(false);
                warn!(sequence, error = %err, "Capture failed");
                self.guidance_tx.send_replace(Some(FrameGuidance {
                    sequence,
                    result: ClassificationResult::no_detection(),
                    bounds: None,
                }));
            }
        }
    }
}
