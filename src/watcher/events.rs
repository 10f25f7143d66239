//! Re-examination ticks and their batching.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

/// What a tick asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Read the file and diff it against its snapshot.
    Examine,
    /// The file was observed as removed.
    Removed,
}

/// Which event source produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOrigin {
    /// Fixed-interval poller.
    Poll,
    /// OS change notification.
    Notify,
}

impl TickOrigin {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Notify => "notify",
        }
    }
}

/// A request to re-examine one watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Watch-set path of the file.
    pub path: PathBuf,
    pub kind: TickKind,
    pub origin: TickOrigin,
}

impl Tick {
    /// Ask for the file to be re-read.
    pub fn examine(path: impl Into<PathBuf>, origin: TickOrigin) -> Self {
        Self {
            path: path.into(),
            kind: TickKind::Examine,
            origin,
        }
    }

    /// Report the file as removed.
    pub fn removed(path: impl Into<PathBuf>, origin: TickOrigin) -> Self {
        Self {
            path: path.into(),
            kind: TickKind::Removed,
            origin,
        }
    }
}

/// Raw file system change, before it is turned into ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// File was created, written or resized.
    Changed(PathBuf),
    /// File was deleted or moved away.
    Removed(PathBuf),
    /// File was renamed from old path to new path.
    Renamed { from: PathBuf, to: PathBuf },
}

/// Ticks collected from one notification, deduplicated per path.
#[derive(Debug, Default)]
pub struct TickBatch {
    /// Files to re-examine.
    pub examine: Vec<PathBuf>,
    /// Files observed as removed.
    pub removed: Vec<PathBuf>,
}

impl TickBatch {
    /// Create a new empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the batch.
    pub fn add(&mut self, event: FileEvent) {
        match event {
            FileEvent::Changed(path) => self.push_examine(path),
            FileEvent::Removed(path) => self.push_removed(path),
            FileEvent::Renamed { from, to } => {
                self.push_removed(from);
                self.push_examine(to);
            }
        }
    }

    fn push_examine(&mut self, path: PathBuf) {
        // A later write after a removal means the file is back.
        self.removed.retain(|p| p != &path);
        if !self.examine.contains(&path) {
            self.examine.push(path);
        }
    }

    fn push_removed(&mut self, path: PathBuf) {
        self.examine.retain(|p| p != &path);
        if !self.removed.contains(&path) {
            self.removed.push(path);
        }
    }

    /// Keep only paths accepted by `keep`, rewriting each to the value it returns.
    pub fn retain_map(&mut self, mut keep: impl FnMut(&Path) -> Option<PathBuf>) {
        self.examine = self.examine.iter().filter_map(|p| keep(p)).collect();
        self.removed = self.removed.iter().filter_map(|p| keep(p)).collect();
    }

    /// Check if batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examine.is_empty() && self.removed.is_empty()
    }

    /// Get total number of ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examine.len() + self.removed.len()
    }

    /// Turn the batch into ticks, removals first.
    pub fn into_ticks(self, origin: TickOrigin) -> impl Iterator<Item = Tick> {
        self.removed
            .into_iter()
            .map(move |p| Tick::removed(p, origin))
            .chain(self.examine.into_iter().map(move |p| Tick::examine(p, origin)))
    }
}
