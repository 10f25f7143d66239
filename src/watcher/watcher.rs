//! OS change notifications using notify-rs.

#![allow(clippy::used_underscore_binding)]

use std::path::Path;

use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::{FileEvent, Tick, TickBatch, TickOrigin};
use super::watch_set::WatchSet;
use crate::error::WatcherError;
use crate::Result;

/// Subscribes to change notifications for the watch directory.
///
/// Notifications stop when the value is dropped.
pub struct NotifyWatcher {
    _watcher: RecommendedWatcher,
    watch_set: WatchSet,
}

impl std::fmt::Debug for NotifyWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatcher")
            .field("base", &self.watch_set.base())
            .finish_non_exhaustive()
    }
}

impl NotifyWatcher {
    /// Start watching the watch set's directory.
    ///
    /// Ticks are sent from notify's own thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or cannot be watched.
    pub fn start(watch_set: &WatchSet, ticks: mpsc::Sender<Tick>) -> Result<Self> {
        let base = watch_set.base().to_path_buf();

        if !base.is_dir() {
            return Err(WatcherError::WatchFailed {
                path: base.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        let set = watch_set.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => forward(&set, &event, &ticks),
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            },
            notify::Config::default(),
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: base.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(&base, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: base.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %base.display(), "Watching directory");

        Ok(Self {
            _watcher: watcher,
            watch_set: watch_set.clone(),
        })
    }

    /// Directory being watched.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.watch_set.base()
    }
}

fn forward(set: &WatchSet, event: &Event, ticks: &mpsc::Sender<Tick>) {
    let mut batch = classify(event);
    batch.retain_map(|p| set.lookup(p).map(Path::to_path_buf));

    for tick in batch.into_ticks(TickOrigin::Notify) {
        tracing::trace!(path = %tick.path.display(), kind = ?tick.kind, "Notification tick");
        if ticks.blocking_send(tick).is_err() {
            return;
        }
    }
}

/// Translate a raw notification into file events.
///
/// Only writes, size/attribute changes and names matter; access events are
/// ignored.
fn classify(event: &Event) -> TickBatch {
    let mut batch = TickBatch::new();
    let paths = &event.paths;

    match event.kind {
        EventKind::Access(_)
        | EventKind::Other
        | EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => {}
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            for path in paths {
                batch.add(FileEvent::Removed(path.clone()));
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
            batch.add(FileEvent::Renamed {
                from: paths[0].clone(),
                to: paths[1].clone(),
            });
        }
        // Ambiguous renames and everything else: let the engine look at the file.
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) => {
            for path in paths {
                batch.add(FileEvent::Changed(path.clone()));
            }
        }
    }

    batch
}
