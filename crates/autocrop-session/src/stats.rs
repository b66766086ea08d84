// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-session counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters updated by the frame worker and read from any thread.
#[derive(Debug, Default)]
pub struct SessionStats {
    submitted: AtomicU64,
    processed: AtomicU64,
    dropped_stale: AtomicU64,
    over_budget: AtomicU64,
    detection_failures: AtomicU64,
    captures_completed: AtomicU64,
    captures_failed: AtomicU64,
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Frames handed to the session.
    pub submitted: u64,
    /// Frames that produced guidance.
    pub processed: u64,
    /// Frames replaced by a newer one before the worker reached them.
    pub dropped_stale: u64,
    /// Frames whose detection overran the frame budget.
    pub over_budget: u64,
    /// Frames where the detector returned an error.
    pub detection_failures: u64,
    pub captures_completed: u64,
    pub captures_failed: u64,
}

impl SessionStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_stale(&self) {
        self.dropped_stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_over_budget(&self) {
        self.over_budget.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_detection_failure(&self) {
        self.detection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.captures_completed
        } else {
            &self.captures_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            dropped_stale: self.dropped_stale.load(Ordering::Relaxed),
            over_budget: self.over_budget.load(Ordering::Relaxed),
            detection_failures: self.detection_failures.load(Ordering::Relaxed),
            captures_completed: self.captures_completed.load(Ordering::Relaxed),
            captures_failed: self.captures_failed.load(Ordering::Relaxed),
        }
    }
}
