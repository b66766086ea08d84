// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AutoCrop Session — runs detection, classification, and rectification for a
// stream of camera frames on a background task, honours capture requests, and
// publishes the latest guidance and capture on watch channels.

pub mod session;
pub mod stats;
pub mod trigger;

pub use session::{Capture, ScanSession};
pub use stats::{SessionStats, StatsSnapshot};
pub use trigger::CaptureTrigger;
