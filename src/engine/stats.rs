//! Per-engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::diff::ChangeEvent;
use crate::error::ReadError;
use crate::telemetry::metrics;
use crate::watcher::TickOrigin;

/// Counters for one engine. Each update also feeds the process metrics.
#[derive(Debug, Default)]
pub struct EngineStats {
    ticks: AtomicU64,
    suppressed: AtomicU64,
    examined: AtomicU64,
    unchanged: AtomicU64,
    changesets: AtomicU64,
    created: AtomicU64,
    deleted: AtomicU64,
    read_failures: AtomicU64,
    evicted: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub ticks: u64,
    pub suppressed: u64,
    pub examined: u64,
    pub unchanged: u64,
    pub changesets: u64,
    pub created: u64,
    pub deleted: u64,
    pub read_failures: u64,
    pub evicted: u64,
}

impl EngineStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tick(&self, origin: TickOrigin) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        metrics::TICKS_TOTAL.with_label_values(&[origin.as_str()]).inc();
    }

    pub(crate) fn suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
        metrics::TICKS_SUPPRESSED.inc();
    }

    pub(crate) fn examined(&self, changed: bool) {
        self.examined.fetch_add(1, Ordering::Relaxed);
        if !changed {
            self.unchanged.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn changeset(&self, changes: &[ChangeEvent]) {
        self.changesets.fetch_add(1, Ordering::Relaxed);
        for change in changes {
            metrics::LINE_CHANGES.with_label_values(&[change.kind()]).inc();
        }
    }

    pub(crate) fn created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
        metrics::FILE_NOTICES.with_label_values(&["created"]).inc();
    }

    pub(crate) fn deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
        metrics::FILE_NOTICES.with_label_values(&["deleted"]).inc();
    }

    pub(crate) fn read_failed(&self, err: &ReadError) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
        metrics::READ_FAILURES.with_label_values(&[err.kind()]).inc();
    }

    pub(crate) fn evicted(&self, count: usize) {
        let count = count as u64;
        self.evicted.fetch_add(count, Ordering::Relaxed);
        metrics::SNAPSHOTS_EVICTED.inc_by(count);
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            examined: self.examined.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            changesets: self.changesets.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}
