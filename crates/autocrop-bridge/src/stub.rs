// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub detector for builds where no native vision framework is linked.
//
// Every call returns `PlatformUnavailable`, which the session turns into the
// "can't detect" guidance.

use autocrop_core::error::{AutoCropError, Result};
use autocrop_core::Detection;
use image::RgbaImage;

use crate::traits::RectangleDetector;

/// Detector returned when the platform offers no rectangle detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDetector;

impl RectangleDetector for StubDetector {
    fn name(&self) -> &str {
        "stub"
    }

    fn detect(&self, _frame: &RgbaImage) -> Result<Option<Detection>> {
        tracing::warn!("RectangleDetector::detect called on stub detector");
        Err(AutoCropError::PlatformUnavailable)
    }
}
