// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture trigger — the edge-triggered "take the picture" flag shared between
// the UI and the frame worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Edge-triggered capture request.
///
/// Any number of [`request`](Self::request) calls before the worker sees the
/// flag collapse into one capture. [`take`](Self::take) clears the flag in the
/// same atomic step that reads it, so a request is honoured at most once.
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CaptureTrigger {
    pending: Arc<AtomicBool>,
}

impl CaptureTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the next frame with a detection to be rectified.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending request. Returns `true` exactly once per request.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Whether a request is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Drop a pending request without honouring it.
    pub fn cancel(&self) {
        self.pending.store(false, Ordering::Release);
    }
}
