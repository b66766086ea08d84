// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector that reports the same observation for every frame. Used when the
// corners are known up front (command-line input, replayed sessions).

use autocrop_core::error::Result;
use autocrop_core::{Detection, Quadrilateral};
use image::RgbaImage;
use tracing::trace;

use crate::traits::RectangleDetector;

/// Reports a fixed detection (or none) regardless of frame content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDetector {
    detection: Option<Detection>,
}

impl FixedDetector {
    /// Always report `quad` with full confidence.
    pub fn new(quad: Quadrilateral) -> Self {
        Self {
            detection: Some(Detection {
                quad,
                confidence: 1.0,
            }),
        }
    }

    /// Never report anything.
    pub fn empty() -> Self {
        Self { detection: None }
    }
}

impl RectangleDetector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn detect(&self, frame: &RgbaImage) -> Result<Option<Detection>> {
        trace!(
            width = frame.width(),
            height = frame.height(),
            detected = self.detection.is_some(),
            "Fixed detector consulted"
        );
        Ok(self.detection)
    }
}
