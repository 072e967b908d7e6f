//! Lock-free coordinator counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters updated by the coordinator.
///
/// All operations use `Relaxed` ordering; counters are independent.
#[derive(Debug, Default)]
pub struct CoordinatorStats {
    requests: AtomicU64,
    fetches_issued: AtomicU64,
    coalesced: AtomicU64,
    evictions: AtomicU64,
    stored: AtomicU64,
    gaps: AtomicU64,
    discarded: AtomicU64,
    failures: AtomicU64,
    callbacks_fired: AtomicU64,
}

impl CoordinatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetches_issued(&self, n: usize) {
        self.fetches_issued.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn coalesced(&self, n: usize) {
        self.coalesced.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn evicted(&self, n: usize) {
        self.evictions.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn gap(&self) {
        self.gaps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn callbacks_fired(&self, n: usize) {
        self.callbacks_fired.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            fetches_issued: self.fetches_issued.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            gaps: self.gaps.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            callbacks_fired: self.callbacks_fired.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`CoordinatorStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// `request_tiles` calls
    pub requests: u64,
    /// Fetches handed to the transport
    pub fetches_issued: u64,
    /// Waiters appended to an in-flight fetch
    pub coalesced: u64,
    /// Keys evicted, explicitly or as stale
    pub evictions: u64,
    /// Completions stored with data
    pub stored: u64,
    /// Completions reporting no tile
    pub gaps: u64,
    /// Completions for keys no longer pending
    pub discarded: u64,
    /// Fetches that failed
    pub failures: u64,
    /// Waiter callbacks invoked
    pub callbacks_fired: u64,
}

impl StatsSnapshot {
    /// Share of fetches that ended with data, 0.0 when none finished.
    pub fn hit_rate(&self) -> f64 {
        let finished = self.stored + self.gaps + self.failures;
        if finished == 0 {
            0.0
        } else {
            self.stored as f64 / finished as f64
        }
    }
}
