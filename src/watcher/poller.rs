//! Fixed-interval poller that ticks every watched file.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::events::{Tick, TickOrigin};
use super::watch_set::WatchSet;

/// Ticks the whole watch set on a timer.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    watch_set: WatchSet,
}

impl Poller {
    #[must_use]
    pub const fn new(interval: Duration, watch_set: WatchSet) -> Self {
        Self {
            interval,
            watch_set,
        }
    }

    /// Start polling on the current runtime.
    ///
    /// The first round fires immediately. The task ends when `cancel` fires
    /// or the tick channel closes.
    #[must_use]
    pub fn spawn(self, ticks: mpsc::Sender<Tick>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(ticks, cancel).await })
    }

    async fn run(self, ticks: mpsc::Sender<Tick>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = self.interval.as_millis(),
            files = self.watch_set.len(),
            "Poller started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            for path in self.watch_set.paths() {
                if ticks
                    .send(Tick::examine(path.clone(), TickOrigin::Poll))
                    .await
                    .is_err()
                {
                    tracing::debug!("Tick channel closed, poller stopping");
                    return;
                }
            }
        }

        tracing::debug!("Poller cancelled");
    }
}
