//! Size cap for the snapshot store.

use serde::{Deserialize, Serialize};

use super::snapshot::SnapshotStore;
use crate::watcher::FileIdentity;

/// How victims are chosen once the store is over budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionMode {
    /// Whatever the map yields first. Not LRU, not insertion order.
    #[default]
    Arbitrary,
    /// Entries read or written least recently.
    LeastRecent,
}

/// Blunt cap: over `threshold` entries, drop `batch` of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    threshold: usize,
    batch: usize,
    mode: EvictionMode,
}

impl EvictionPolicy {
    #[must_use]
    pub const fn new(threshold: usize, batch: usize, mode: EvictionMode) -> Self {
        Self {
            threshold,
            batch,
            mode,
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    #[must_use]
    pub const fn batch(&self) -> usize {
        self.batch
    }

    /// Trim `store` if it is over budget; returns the evicted identities.
    pub fn enforce(&self, store: &SnapshotStore) -> Vec<FileIdentity> {
        let evicted = store.evict(self.threshold, self.batch, self.mode);
        if !evicted.is_empty() {
            tracing::debug!(
                evicted = evicted.len(),
                remaining = store.len(),
                mode = ?self.mode,
                "Evicted snapshots"
            );
        }
        evicted
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_EVICTION_THRESHOLD,
            crate::config::DEFAULT_EVICTION_BATCH,
            EvictionMode::default(),
        )
    }
}
