// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AutoCrop — Collaborator bridge.
//
// The classification and rectification core never talks to a camera or a
// screen directly. Frames come in through a `RectangleDetector`, and guidance
// and captures go out through an `OverlayRenderer`. Platform integrations
// (Vision on iOS, a CPU detector on desktop) implement these traits.

pub mod fixed;
pub mod logging;
pub mod stub;
pub mod traits;

pub use fixed::FixedDetector;
pub use logging::TracingRenderer;
pub use stub::StubDetector;
pub use traits::{OverlayRenderer, RectangleDetector};
