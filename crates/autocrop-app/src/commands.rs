// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use autocrop_bridge::{FixedDetector, RectangleDetector, TracingRenderer};
use autocrop_core::error::{AutoCropError, Result};
use autocrop_core::{AutoCropConfig, FrameGuidance, Quadrilateral};
use autocrop_session::ScanSession;
use autocrop_vision::{HoughDetector, classify as classify_quad, frame, rectify as rectify_quad};
use tracing::{info, instrument, warn};

/// How often `session` re-checks for a frame that overran its budget.
const SETTLE_POLL: Duration = Duration::from_millis(5);

/// Frame budget for replayed files. There is no camera deadline, and the CPU
/// detector needs far longer than a live preview allows.
const REPLAY_FRAME_BUDGET_MS: u64 = 10_000;

/// Build a quadrilateral from eight coordinates in `TL, TR, BL, BR` order.
pub fn parse_corners(coords: &[f32]) -> Result<Quadrilateral> {
    let coords: [f32; 8] = coords.try_into().map_err(|_| {
        AutoCropError::InvalidGeometry(format!(
            "expected 8 corner coordinates (TLx,TLy,TRx,TRy,BLx,BLy,BRx,BRy), got {}",
            coords.len()
        ))
    })?;
    Ok(Quadrilateral::from_coords(coords))
}

pub fn classify(config: &AutoCropConfig, corners: &[f32], json: bool) -> Result<()> {
    let quad = parse_corners(corners)?;
    let result = classify_quad(Some(&quad), &config.classifier);

    if json {
        let guidance = FrameGuidance {
            sequence: 0,
            bounds: result.has_detection().then(|| quad.bounding_box()),
            result,
        };
        println!("{}", serde_json::to_string_pretty(&guidance)?);
    } else {
        println!("{}\t{}", result.state, result.hint);
    }
    Ok(())
}

/// Rectify one image file. Without explicit corners the CPU detector looks
/// for the document first.
#[instrument(skip(config, corners), fields(input = %input.display(), output = %output.display()))]
pub fn rectify(
    config: &AutoCropConfig,
    input: &Path,
    output: &Path,
    corners: Option<&[f32]>,
) -> Result<()> {
    let image = frame::open(input)?;

    let quad = match corners {
        Some(coords) => parse_corners(coords)?,
        None => {
            let detector = HoughDetector::new(config.detector);
            let detection = detector.detect(&image)?.ok_or_else(|| {
                AutoCropError::DetectionFailed(format!("no document found in {}", input.display()))
            })?;
            info!(confidence = detection.confidence, "Document detected");
            detection.quad
        }
    };

    let guidance = classify_quad(Some(&quad), &config.classifier);
    info!(state = %guidance.state, hint = %guidance.hint, "Framing");

    let rectified = rectify_quad(&quad, &image)?;
    rectified.save(output)?;
    println!(
        "{}\t{}x{}",
        output.display(),
        rectified.width(),
        rectified.height()
    );
    Ok(())
}

/// Inputs for [`session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub frames: Vec<PathBuf>,
    /// 1-based frame index before which a capture is requested.
    pub capture_at: usize,
    pub output: Option<PathBuf>,
    pub corners: Option<Vec<f32>>,
    /// Per-frame detection budget; [`REPLAY_FRAME_BUDGET_MS`] when unset.
    pub budget_ms: Option<u64>,
}

/// Feed image files through a scan session one at a time, printing the
/// guidance for each and saving the capture.
pub async fn session(mut config: AutoCropConfig, options: SessionOptions) -> Result<()> {
    config.session.frame_budget_ms = options.budget_ms.unwrap_or(REPLAY_FRAME_BUDGET_MS);
    info!(budget_ms = config.session.frame_budget_ms, "Replaying frames");

    let detector: Arc<dyn RectangleDetector> = match options.corners.as_deref() {
        Some(coords) => Arc::new(FixedDetector::new(parse_corners(coords)?)),
        None => Arc::new(HoughDetector::new(config.detector)),
    };

    let mut session = ScanSession::start(detector, config)?;
    session.attach_renderer(Arc::new(TracingRenderer::new()))?;

    for (index, path) in options.frames.iter().enumerate() {
        let image = frame::open(path)?;
        if index + 1 == options.capture_at {
            session.request_capture();
        }

        let over_budget = session.stats().over_budget;
        let sequence = session.submit_frame(image)?;
        match settle(&session, sequence, over_budget).await {
            Some(guidance) => println!(
                "{sequence}\t{}\t{}",
                guidance.result.state, guidance.result.hint
            ),
            None => println!("{sequence}\tdropped"),
        }
    }

    // The worker finishes its current frame, including any capture, before
    // it sees the shutdown signal.
    let stats = session.stop().await;
    let capture = session.captures().borrow().clone();

    match (capture, options.output.as_deref()) {
        (Some(capture), Some(path)) => {
            capture.rectified.save(path)?;
            println!("captured frame {} -> {}", capture.sequence, path.display());
        }
        (Some(capture), None) => println!(
            "captured frame {} ({}x{})",
            capture.sequence,
            capture.rectified.width(),
            capture.rectified.height()
        ),
        (None, _) => warn!(capture_at = options.capture_at, "No capture was taken"),
    }

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Wait until `sequence` has been classified, or has been dropped for
/// overrunning the frame budget (`None`).
async fn settle(session: &ScanSession, sequence: u64, over_budget_before: u64) -> Option<FrameGuidance> {
    let mut guidance = session.guidance();
    loop {
        let latest = guidance.borrow_and_update().clone();
        if let Some(latest) = latest.filter(|g| g.sequence >= sequence) {
            return Some(latest);
        }
        if session.stats().over_budget > over_budget_before {
            return None;
        }

        tokio::select! {
            changed = guidance.changed() => {
                if changed.is_err() {
                    return None;
                }
            }
            _ = tokio::time::sleep(SETTLE_POLL) => {}
        }
    }
}

pub fn config(config: &AutoCropConfig, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            println!("wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
