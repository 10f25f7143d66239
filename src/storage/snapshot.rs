//! In-memory snapshot store.
//!
//! Holds the last-known lines of every watched file, keyed by identity.
//! All access goes through an internal `parking_lot::RwLock`; callers never
//! lock anything themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use blake3::Hasher;
use parking_lot::RwLock;

use super::eviction::EvictionMode;
use crate::watcher::FileIdentity;

/// Compute the content digest of a line sequence.
#[must_use]
pub fn content_digest(lines: &[String]) -> blake3::Hash {
    let mut hasher = Hasher::new();
    for line in lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

/// Last-known content of one file.
///
/// Immutable; updates replace the whole value. Clone is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    identity: FileIdentity,
    lines: Arc<[String]>,
    digest: blake3::Hash,
    placeholder: bool,
}

impl Snapshot {
    /// Snapshot of content read from disk.
    #[must_use]
    pub fn observed(identity: FileIdentity, lines: Vec<String>) -> Self {
        let digest = content_digest(&lines);
        Self {
            identity,
            lines: lines.into(),
            digest,
            placeholder: false,
        }
    }

    /// Empty snapshot for a watched file that did not exist when tracking began.
    #[must_use]
    pub fn placeholder(identity: FileIdentity) -> Self {
        Self {
            identity,
            lines: Vec::new().into(),
            digest: content_digest(&[]),
            placeholder: true,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub const fn digest(&self) -> &blake3::Hash {
        &self.digest
    }

    /// Whether this snapshot stands in for a file never seen on disk.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Whether `lines` hash to the same digest as this snapshot.
    #[must_use]
    pub fn matches(&self, lines: &[String]) -> bool {
        !self.placeholder && self.digest == content_digest(lines)
    }

    fn rekeyed(&self, identity: FileIdentity) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }
}

#[derive(Debug)]
struct Entry {
    snapshot: Snapshot,
    touched: AtomicU64,
}

/// Concurrent identity → snapshot map.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: RwLock<HashMap<FileIdentity, Entry>>,
    clock: AtomicU64,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Current snapshot for `id`.
    #[must_use]
    pub fn get(&self, id: &FileIdentity) -> Option<Snapshot> {
        let entries = self.entries.read();
        let entry = entries.get(id)?;
        entry.touched.store(self.tick(), Ordering::Relaxed);
        Some(entry.snapshot.clone())
    }

    /// Store `snapshot` under its identity, replacing any previous one.
    pub fn put(&self, snapshot: Snapshot) {
        let entry = Entry {
            touched: AtomicU64::new(self.tick()),
            snapshot,
        };
        self.entries
            .write()
            .insert(entry.snapshot.identity().clone(), entry);
    }

    /// Remove and return the snapshot for `id`.
    pub fn remove(&self, id: &FileIdentity) -> Option<Snapshot> {
        self.entries.write().remove(id).map(|e| e.snapshot)
    }

    /// Move the snapshot stored under `from` to `to`.
    ///
    /// An existing entry under `to` is replaced. Returns `false` when there
    /// was nothing to move.
    pub fn rekey(&self, from: &FileIdentity, to: FileIdentity) -> bool {
        let mut entries = self.entries.write();
        let Some(entry) = entries.remove(from) else {
            return false;
        };
        let snapshot = entry.snapshot.rekeyed(to.clone());
        entries.insert(
            to,
            Entry {
                snapshot,
                touched: entry.touched,
            },
        );
        true
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &FileIdentity) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Drop `count` entries if more than `threshold` are stored.
    ///
    /// The size check and the removal happen under one write lock.
    pub fn evict(&self, threshold: usize, count: usize, mode: EvictionMode) -> Vec<FileIdentity> {
        let mut entries = self.entries.write();
        if entries.len() <= threshold {
            return Vec::new();
        }

        let victims: Vec<FileIdentity> = match mode {
            EvictionMode::Arbitrary => entries.keys().take(count).cloned().collect(),
            EvictionMode::LeastRecent => {
                let mut by_age: Vec<(u64, &FileIdentity)> = entries
                    .iter()
                    .map(|(id, e)| (e.touched.load(Ordering::Relaxed), id))
                    .collect();
                by_age.sort_unstable_by_key(|(touched, _)| *touched);
                by_age
                    .into_iter()
                    .take(count)
                    .map(|(_, id)| id.clone())
                    .collect()
            }
        };

        for id in &victims {
            entries.remove(id);
        }
        victims
    }
}
