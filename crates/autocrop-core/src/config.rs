// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tunables for classification, detection, and the frame-processing session.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AutoCropError, Result};

/// Complete AutoCrop configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCropConfig {
    pub classifier: ClassifierConfig,
    pub detector: DetectorConfig,
    pub session: SessionConfig,
}

/// Edge-length thresholds used by the quadrilateral classifier.
///
/// All values are fractions of the normalized frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A top edge shorter than this reads as "too far".
    pub too_far_below: f32,
    /// A top edge longer than this reads as "too close".
    pub too_close_above: f32,
    /// Maximum allowed difference between top and bottom edge lengths.
    pub skew_tolerance: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            too_far_below: 0.5,
            too_close_above: 0.9,
            skew_tolerance: 0.5,
        }
    }
}

/// Tuning parameters for the upstream rectangle detector.
///
/// Detectors report at most one observation per frame, so there is no
/// observation count to tune.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Lowest accepted short-side / long-side ratio.
    pub min_aspect_ratio: f32,
    /// Highest accepted short-side / long-side ratio.
    pub max_aspect_ratio: f32,
    /// Shortest side as a fraction of the smaller frame dimension.
    pub min_size: f32,
    /// Maximum deviation of any corner angle from 90 degrees.
    pub quadrature_tolerance_deg: f32,
    /// Minimum detector confidence.
    pub min_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_aspect_ratio: 0.3,
            max_aspect_ratio: 0.9,
            min_size: 0.3,
            quadrature_tolerance_deg: 30.0,
            min_confidence: 0.6,
        }
    }
}

/// Frame-processing session settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Time budget for detecting and classifying one frame, in milliseconds.
    pub frame_budget_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        // Well under one frame interval at 30 fps.
        Self { frame_budget_ms: 25 }
    }
}

impl SessionConfig {
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }
}

impl AutoCropConfig {
    /// Thresholds of the first camera-integration variant.
    pub fn variant_a() -> Self {
        let mut config = Self::default();
        config.classifier.skew_tolerance = 0.55;
        config.detector.min_aspect_ratio = 0.3;
        config
    }

    /// Thresholds of the second camera-integration variant.
    pub fn variant_b() -> Self {
        let mut config = Self::default();
        config.classifier.skew_tolerance = 0.45;
        config.detector.min_aspect_ratio = 0.1;
        config
    }

    /// Look up a preset by name (`default`, `variant-a`, `variant-b`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(Self::default()),
            "variant-a" | "a" => Some(Self::variant_a()),
            "variant-b" | "b" => Some(Self::variant_b()),
            _ => None,
        }
    }

    /// Reject thresholds that cannot produce a meaningful classification.
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        if !(c.too_far_below.is_finite() && c.too_close_above.is_finite()) {
            return Err(AutoCropError::Config("classifier thresholds must be finite".into()));
        }
        if c.too_far_below < 0.0 || c.too_far_below > c.too_close_above {
            return Err(AutoCropError::Config(format!(
                "too_far_below ({}) must be in [0, too_close_above ({})]",
                c.too_far_below, c.too_close_above
            )));
        }
        if !c.skew_tolerance.is_finite() || c.skew_tolerance < 0.0 {
            return Err(AutoCropError::Config(format!(
                "skew_tolerance must be non-negative, got {}",
                c.skew_tolerance
            )));
        }

        let d = &self.detector;
        if !(0.0..=1.0).contains(&d.min_aspect_ratio)
            || !(0.0..=1.0).contains(&d.max_aspect_ratio)
            || d.min_aspect_ratio > d.max_aspect_ratio
        {
            return Err(AutoCropError::Config(format!(
                "aspect ratio bounds [{}, {}] must satisfy 0 <= min <= max <= 1",
                d.min_aspect_ratio, d.max_aspect_ratio
            )));
        }
        if !(0.0..=1.0).contains(&d.min_size) {
            return Err(AutoCropError::Config(format!(
                "min_size must be in [0, 1], got {}",
                d.min_size
            )));
        }
        if !(0.0..=45.0).contains(&d.quadrature_tolerance_deg) {
            return Err(AutoCropError::Config(format!(
                "quadrature_tolerance_deg must be in [0, 45], got {}",
                d.quadrature_tolerance_deg
            )));
        }
        if !(0.0..=1.0).contains(&d.min_confidence) {
            return Err(AutoCropError::Config(format!(
                "min_confidence must be in [0, 1], got {}",
                d.min_confidence
            )));
        }
        if self.session.frame_budget_ms == 0 {
            return Err(AutoCropError::Config("frame_budget_ms must be positive".into()));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = AutoCropConfig::default();
        assert_eq!(config.classifier.too_far_below, 0.5);
        assert_eq!(config.classifier.too_close_above, 0.9);
        assert_eq!(config.classifier.skew_tolerance, 0.5);
        assert_eq!(config.detector.min_aspect_ratio, 0.3);
        assert_eq!(config.detector.max_aspect_ratio, 0.9);
        assert_eq!(config.detector.min_size, 0.3);
        assert_eq!(config.detector.quadrature_tolerance_deg, 30.0);
        assert_eq!(config.detector.min_confidence, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn presets_differ_only_in_tunables() {
        let a = AutoCropConfig::variant_a();
        let b = AutoCropConfig::variant_b();
        assert_eq!(a.classifier.skew_tolerance, 0.55);
        assert_eq!(b.classifier.skew_tolerance, 0.45);
        assert_eq!(a.detector.min_aspect_ratio, 0.3);
        assert_eq!(b.detector.min_aspect_ratio, 0.1);
        assert_eq!(a.detector.max_aspect_ratio, b.detector.max_aspect_ratio);
        assert!(a.validate().is_ok());
        assert!(b.validate().is_ok());
        assert_eq!(AutoCropConfig::preset("Variant-B"), Some(b));
        assert!(AutoCropConfig::preset("unknown").is_none());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = AutoCropConfig::default();
        config.classifier.too_far_below = 0.95;
        assert!(matches!(config.validate(), Err(AutoCropError::Config(_))));

        let mut config = AutoCropConfig::default();
        config.detector.min_aspect_ratio = 0.95;
        assert!(config.validate().is_err());

        let mut config = AutoCropConfig::default();
        config.classifier.skew_tolerance = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("autocrop.json");

        let config = AutoCropConfig::variant_b();
        config.save(&path).expect("save");
        let loaded = AutoCropConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AutoCropConfig =
            serde_json::from_str(r#"{ "classifier": { "skew_tolerance": 0.45 } }"#)
                .expect("parse");
        assert_eq!(config.classifier.skew_tolerance, 0.45);
        assert_eq!(config.classifier.too_far_below, 0.5);
        assert_eq!(config.session.frame_budget_ms, 25);
    }

    #[test]
    fn unknown_detector_keys_are_ignored() {
        // Files written before the observation count was dropped still load.
        let config: AutoCropConfig = serde_json::from_str(
            r#"{ "detector": { "min_confidence": 0.7, "max_observations": 3 } }"#,
        )
        .expect("parse");
        assert_eq!(config.detector.min_confidence, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "session": { "frame_budget_ms": 0 } }"#).expect("write");
        assert!(matches!(
            AutoCropConfig::load(&path),
            Err(AutoCropError::Config(_))
        ));
    }
}
