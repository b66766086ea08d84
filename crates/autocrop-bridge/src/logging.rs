// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer for headless runs: guidance and captures are written to the
// tracing log instead of a preview layer.

use autocrop_core::FrameGuidance;
use image::RgbaImage;
use tracing::{debug, info};

use crate::traits::OverlayRenderer;

/// Logs guidance changes and captures.
///
/// Only state transitions are logged at `info`; repeated guidance for
/// consecutive frames goes to `debug`.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    last_state: std::sync::Mutex<Option<autocrop_core::GuidanceState>>,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlayRenderer for TracingRenderer {
    fn show_guidance(&self, guidance: &FrameGuidance) {
        let state = guidance.result.state;
        let changed = match self.last_state.lock() {
            Ok(mut last) => last.replace(state) != Some(state),
            Err(_) => true,
        };
        if changed {
            info!(
                sequence = guidance.sequence,
                state = %state,
                hint = %guidance.result.hint,
                "Guidance changed"
            );
        } else {
            debug!(sequence = guidance.sequence, state = %state, "Guidance");
        }
    }

    fn show_capture(&self, sequence: u64, image: &RgbaImage) {
        info!(
            sequence,
            width = image.width(),
            height = image.height(),
            "Capture ready"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocrop_core::{ClassificationResult, GuidanceState};

    fn guidance(sequence: u64, state: GuidanceState) -> FrameGuidance {
        FrameGuidance {
            sequence,
            result: ClassificationResult::new(state),
            bounds: None,
        }
    }

    #[test]
    fn remembers_last_state() {
        let renderer = TracingRenderer::new();
        renderer.show_guidance(&guidance(1, GuidanceState::TooFar));
        renderer.show_guidance(&guidance(2, GuidanceState::Ready));
        renderer.show_capture(2, &RgbaImage::new(8, 4));

        let last = *renderer.last_state.lock().expect("lock");
        assert_eq!(last, Some(GuidanceState::Ready));
    }
}
