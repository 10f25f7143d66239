//! Interchangeable producers of re-examination ticks.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::events::Tick;
use super::poller::Poller;
use super::watch_set::WatchSet;
use super::watcher::NotifyWatcher;
use crate::Result;

/// A way of producing ticks for the watch set.
///
/// Several sources may feed the same engine at once; its debouncer keeps
/// them from duplicating work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    /// Tick every watched file on a fixed interval.
    Poll { interval: Duration },
    /// Tick files as the OS reports changes in the watch directory.
    Notify,
}

impl EventSource {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Poll { .. } => "poll",
            Self::Notify => "notify",
        }
    }

    /// Start delivering ticks into `ticks`.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification watcher cannot be installed.
    pub fn start(
        &self,
        watch_set: &WatchSet,
        ticks: mpsc::Sender<Tick>,
        cancel: &CancellationToken,
    ) -> Result<RunningSource> {
        match self {
            Self::Poll { interval } => {
                let cancel = cancel.child_token();
                let handle = Poller::new(*interval, watch_set.clone()).spawn(ticks, cancel.clone());
                Ok(RunningSource::Poll { handle, cancel })
            }
            Self::Notify => Ok(RunningSource::Notify(NotifyWatcher::start(watch_set, ticks)?)),
        }
    }
}

/// A started source; stop it to release its resources.
#[derive(Debug)]
pub enum RunningSource {
    Poll {
        handle: JoinHandle<()>,
        cancel: CancellationToken,
    },
    Notify(NotifyWatcher),
}

impl RunningSource {
    /// Stop the source and wait for it to finish.
    pub async fn stop(self) {
        match self {
            Self::Poll { handle, cancel } => {
                cancel.cancel();
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "Poller task ended abnormally");
                }
            }
            Self::Notify(watcher) => {
                tracing::debug!(path = %watcher.directory().display(), "Stopping notifications");
                drop(watcher);
            }
        }
    }
}
