// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// autocrop-vision — Per-frame image logic for AutoCrop.
//
// Provides the quadrilateral quality classifier, the perspective rectifier,
// camera frame import, and a CPU rectangle detector for platforms without a
// native vision framework.

pub mod classify;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod rectify;

pub use classify::{classify, classify_state};
pub use detect::HoughDetector;
pub use rectify::{RectifiedImage, rectify};
