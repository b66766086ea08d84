// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the detector and renderer
// collaborators.

use autocrop_core::error::Result;
use autocrop_core::{Detection, FrameGuidance};
use image::RgbaImage;

/// Finds at most one document-like quadrilateral in a frame.
///
/// Implementations are called from a blocking worker thread, so they must be
/// `Send + Sync`. A returned `Err` is treated as `DetectionFailed` for that
/// frame only.
pub trait RectangleDetector: Send + Sync {
    /// Short identifier used in logs (e.g. "vision", "hough").
    fn name(&self) -> &str;

    /// Detect a quadrilateral in `frame`.
    ///
    /// Returns `Ok(None)` when nothing qualifies. Corners are normalized to
    /// the unit square with a bottom-left origin.
    fn detect(&self, frame: &RgbaImage) -> Result<Option<Detection>>;
}

/// Presents guidance and captured images.
pub trait OverlayRenderer: Send + Sync {
    /// Called once per processed frame with the latest guidance.
    fn show_guidance(&self, guidance: &FrameGuidance);

    /// Called when a capture request produced a rectified image.
    fn show_capture(&self, sequence: u64, image: &RgbaImage);
}
