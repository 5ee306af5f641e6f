//! Per-instance fetch counters.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

#[derive(Debug, Default)]
pub struct ListMetrics {
    issued: AtomicU64,
    covered: AtomicU64,
    rendered: AtomicU64,
    stale: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListMetricsSnapshot {
    /// Range requests sent to the store.
    pub issued: u64,
    /// Window computations short-circuited because the window already covered them.
    pub covered: u64,
    /// Fetches whose rows reached the renderer.
    pub rendered: u64,
    /// Fetches discarded because a newer one had been issued.
    pub stale: u64,
    pub cancelled: u64,
    pub failed: u64,
}

impl ListMetrics {
    pub fn snapshot(&self) -> ListMetricsSnapshot {
        ListMetricsSnapshot {
            issued: self.issued.load(Relaxed),
            covered: self.covered.load(Relaxed),
            rendered: self.rendered.load(Relaxed),
            stale: self.stale.load(Relaxed),
            cancelled: self.cancelled.load(Relaxed),
            failed: self.failed.load(Relaxed),
        }
    }
    pub(crate) fn incr_issued(&self) {
        self.issued.fetch_add(1, Relaxed);
    }
    pub(crate) fn incr_covered(&self) {
        self.covered.fetch_add(1, Relaxed);
    }
    pub(crate) fn incr_rendered(&self) {
        self.rendered.fetch_add(1, Relaxed);
    }
    pub(crate) fn incr_stale(&self) {
        self.stale.fetch_add(1, Relaxed);
    }
    pub(crate) fn incr_cancelled(&self) {
        self.cancelled.fetch_add(1, Relaxed);
    }
    pub(crate) fn incr_failed(&self) {
        self.failed.fetch_add(1, Relaxed);
    }
}
