// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral quality classifier — turns one frame's detection into the
// guidance shown over the preview.

use autocrop_core::{ClassificationResult, ClassifierConfig, GuidanceState, Quadrilateral};
use tracing::trace;

/// Classify a detected quadrilateral into a guidance state.
///
/// Corners are expected in normalized frame coordinates, so edge lengths are
/// fractions of the frame. Rules are checked in order and the first match
/// wins:
///
/// 1. top edge shorter than `too_far_below` → [`GuidanceState::TooFar`]
/// 2. top edge longer than `too_close_above` → [`GuidanceState::TooClose`]
/// 3. top and bottom edges differ by more than `skew_tolerance` →
///    [`GuidanceState::Skewed`]
/// 4. otherwise → [`GuidanceState::Ready`]
///
/// `None` (nothing detected) and quadrilaterals with non-finite corners map
/// to [`GuidanceState::NoDetection`].
pub fn classify_state(quad: Option<&Quadrilateral>, config: &ClassifierConfig) -> GuidanceState {
    let Some(quad) = quad else {
        return GuidanceState::NoDetection;
    };
    if !quad.is_finite() {
        return GuidanceState::NoDetection;
    }

    let distance_top = quad.distance_top();
    let distance_bottom = quad.distance_bottom();
    trace!(distance_top, distance_bottom, "Edge distances");

    // A short top edge reads as "too far" (hint: move closer). Zero-length
    // edges land here too.
    if distance_top < config.too_far_below {
        GuidanceState::TooFar
    } else if distance_top > config.too_close_above {
        GuidanceState::TooClose
    } else if (distance_top - distance_bottom).abs() > config.skew_tolerance {
        GuidanceState::Skewed
    } else {
        GuidanceState::Ready
    }
}

/// Classify and attach the hint text and colour tag for the overlay.
pub fn classify(quad: Option<&Quadrilateral>, config: &ClassifierConfig) -> ClassificationResult {
    ClassificationResult::new(classify_state(quad, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocrop_core::{ColorTag, HINT_NO_DETECTION, HINT_READY, HINT_TOO_FAR, Point};

    fn quad(top: f32, bottom: f32) -> Quadrilateral {
        // Horizontal top edge of length `top` at y = 0.9 and bottom edge of
        // length `bottom` at y = 0.1, both starting at x = 0.05.
        Quadrilateral::new(
            Point::new(0.05, 0.9),
            Point::new(0.05 + top, 0.9),
            Point::new(0.05, 0.1),
            Point::new(0.05 + bottom, 0.1),
        )
    }

    fn state(q: &Quadrilateral) -> GuidanceState {
        classify_state(Some(q), &ClassifierConfig::default())
    }

    #[test]
    fn none_is_no_detection() {
        let result = classify(None, &ClassifierConfig::default());
        assert_eq!(result.state, GuidanceState::NoDetection);
        assert_eq!(result.hint, HINT_NO_DETECTION);
        assert_eq!(result.color, ColorTag::Warning);
    }

    #[test]
    fn aligned_document_is_ready() {
        let q = Quadrilateral::from_coords([0.1, 0.9, 0.9, 0.9, 0.1, 0.1, 0.9, 0.1]);
        let result = classify(Some(&q), &ClassifierConfig::default());
        assert_eq!(result.state, GuidanceState::Ready);
        assert_eq!(result.hint, HINT_READY);
        assert_eq!(result.color, ColorTag::Affirmative);
    }

    #[test]
    fn short_top_edge_is_too_far() {
        let q = Quadrilateral::from_coords([0.1, 0.9, 0.3, 0.9, 0.1, 0.1, 0.9, 0.1]);
        let result = classify(Some(&q), &ClassifierConfig::default());
        assert_eq!(result.state, GuidanceState::TooFar);
        assert_eq!(result.hint, HINT_TOO_FAR);
    }

    #[test]
    fn too_far_ignores_bottom_edge() {
        for bottom in [0.0, 0.2, 0.49, 0.8, 0.95] {
            assert_eq!(state(&quad(0.3, bottom)), GuidanceState::TooFar, "bottom {bottom}");
        }
    }

    #[test]
    fn long_top_edge_is_too_close() {
        for bottom in [0.0, 0.5, 0.92] {
            assert_eq!(state(&quad(0.92, bottom)), GuidanceState::TooClose, "bottom {bottom}");
        }
    }

    #[test]
    fn large_edge_difference_is_skewed() {
        assert_eq!(state(&quad(0.8, 0.2)), GuidanceState::Skewed);
        assert_eq!(state(&quad(0.6, 0.0)), GuidanceState::Skewed);
    }

    #[test]
    fn small_edge_difference_is_ready() {
        assert_eq!(state(&quad(0.8, 0.35)), GuidanceState::Ready);
        assert_eq!(state(&quad(0.6, 0.6)), GuidanceState::Ready);
        assert_eq!(state(&quad(0.88, 0.5)), GuidanceState::Ready);
    }

    #[test]
    fn zero_length_edges_are_too_far() {
        let p = Point::new(0.5, 0.5);
        let q = Quadrilateral::new(p, p, p, p);
        assert_eq!(state(&q), GuidanceState::TooFar);
    }

    #[test]
    fn non_finite_corners_are_no_detection() {
        let mut q = quad(0.8, 0.8);
        q.top_right.y = f32::INFINITY;
        assert_eq!(state(&q), GuidanceState::NoDetection);
    }

    #[test]
    fn skew_tolerance_is_configurable() {
        // Edge difference of 0.5 sits between the two observed tolerances.
        let q = quad(0.7, 0.2);
        let strict = ClassifierConfig {
            skew_tolerance: 0.45,
            ..ClassifierConfig::default()
        };
        let lenient = ClassifierConfig {
            skew_tolerance: 0.55,
            ..ClassifierConfig::default()
        };
        assert_eq!(classify_state(Some(&q), &strict), GuidanceState::Skewed);
        assert_eq!(classify_state(Some(&q), &lenient), GuidanceState::Ready);
    }

    #[test]
    fn property_sweep_matches_rules() {
        let config = ClassifierConfig::default();
        let steps = 40;
        for i in 0..=steps {
            for j in 0..=steps {
                let top = i as f32 / steps as f32;
                let bottom = j as f32 / steps as f32;
                let q = quad(top, bottom);
                let dt = q.distance_top();
                let db = q.distance_bottom();
                let expected = if dt < 0.5 {
                    GuidanceState::TooFar
                } else if dt > 0.9 {
                    GuidanceState::TooClose
                } else if (dt - db).abs() > config.skew_tolerance {
                    GuidanceState::Skewed
                } else {
                    GuidanceState::Ready
                };
                assert_eq!(
                    classify_state(Some(&q), &config),
                    expected,
                    "top {top} bottom {bottom}"
                );
            }
        }
    }
}
