//! The change-detection engine.
//!
//! One [`Engine`] owns all state for one watch session: snapshots, the
//! debounce table and the path → identity map. Clone it freely; clones
//! share that state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use super::diff::DiffMode;
use super::report::{ChangeReporter, Report};
use super::stats::EngineStats;
use crate::error::{ReadError, WatcherError};
use crate::storage::{EvictionPolicy, Snapshot, SnapshotStore};
use crate::telemetry::{metrics, spans};
use crate::watcher::{
    path_identity, Debouncer, EventSource, FileIdentity, IdentityResolver, RetryingReader, Tick,
    TickKind, WatchSet,
};
use crate::{Config, Result};

/// Ticks buffered between the sources and the engine loop.
const TICK_CHANNEL_CAPACITY: usize = 256;

/// What the engine remembers about a watch-set path.
#[derive(Debug, Clone)]
struct Tracked {
    id: FileIdentity,
    /// The file has been read from disk at least once.
    seen: bool,
}

struct Inner {
    session_id: Uuid,
    watch_set: WatchSet,
    store: SnapshotStore,
    debouncer: Debouncer,
    reader: RetryingReader,
    resolver: IdentityResolver,
    diff_mode: DiffMode,
    eviction: EvictionPolicy,
    reporter: Arc<dyn ChangeReporter>,
    tracked: Mutex<HashMap<PathBuf, Tracked>>,
    stats: EngineStats,
}

/// Change-detection engine for one watch set.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("session_id", &self.inner.session_id)
            .field("watch_set", &self.inner.watch_set)
            .field("snapshots", &self.inner.store.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine that reads watched files from disk.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration for the session
    /// * `reporter` - Sink for every report the engine produces
    ///
    /// # Returns
    ///
    /// An engine with an empty snapshot store; call [`Engine::prime`] before
    /// [`Engine::run`].
    #[must_use]
    pub fn new(config: &Config, reporter: Arc<dyn ChangeReporter>) -> Self {
        let reader = RetryingReader::new(config.read_attempts, config.retry_delay);
        Self::with_reader(config, reporter, reader)
    }

    /// Create an engine with a custom reader.
    #[must_use]
    pub fn with_reader(
        config: &Config,
        reporter: Arc<dyn ChangeReporter>,
        reader: RetryingReader,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session_id: Uuid::new_v4(),
                watch_set: WatchSet::from_config(config),
                store: SnapshotStore::new(),
                debouncer: Debouncer::new(config.debounce),
                reader,
                resolver: IdentityResolver::new(config.identity),
                diff_mode: config.diff_mode,
                eviction: EvictionPolicy::new(
                    config.eviction_threshold,
                    config.eviction_batch,
                    config.eviction_mode,
                ),
                reporter,
                tracked: Mutex::new(HashMap::new()),
                stats: EngineStats::new(),
            }),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    #[must_use]
    pub fn watch_set(&self) -> &WatchSet {
        &self.inner.watch_set
    }

    #[must_use]
    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    #[must_use]
    pub fn debouncer(&self) -> &Debouncer {
        &self.inner.debouncer
    }

    #[must_use]
    pub fn stats(&self) -> &EngineStats {
        &self.inner.stats
    }

    /// Identity currently used for a watch-set path.
    #[must_use]
    pub fn identity_of(&self, path: &Path) -> Option<FileIdentity> {
        self.inner.tracked.lock().get(path).map(|t| t.id.clone())
    }

    /// Take the initial snapshot of every watched file.
    ///
    /// Missing files get an empty placeholder snapshot. Unreadable files
    /// are reported and also start from an empty snapshot.
    pub async fn prime(&self) {
        for path in self.inner.watch_set.paths() {
            let id = self.inner.resolver.resolve(path);
            let (snapshot, seen) = match self.inner.reader.read(path).await {
                Ok(lines) => (Snapshot::observed(id.clone(), lines), true),
                Err(_) if !path.exists() => {
                    tracing::debug!(path = %path.display(), "Watched file does not exist yet");
                    (Snapshot::placeholder(id.clone()), false)
                }
                Err(e) => {
                    self.read_failed(&id, path, &e);
                    (Snapshot::placeholder(id.clone()), true)
                }
            };

            self.inner
                .tracked
                .lock()
                .insert(path.clone(), Tracked { id, seen });
            self.inner.store.put(snapshot);
            self.enforce_eviction();
        }

        tracing::info!(
            files = self.inner.watch_set.len(),
            snapshots = self.inner.store.len(),
            "Initial snapshots taken"
        );
    }

    /// Handle one tick from any source.
    ///
    /// Failures are reported and contained; they never propagate to the
    /// caller or affect other files.
    pub async fn handle_tick(&self, tick: Tick) {
        if !self.inner.watch_set.paths().contains(&tick.path) {
            tracing::debug!(path = %tick.path.display(), "Ignoring tick for unwatched path");
            return;
        }

        self.inner.stats.tick(tick.origin);
        match tick.kind {
            TickKind::Removed => self.forget(&tick.path),
            TickKind::Examine => self.examine(&tick.path).await,
        }
    }

    /// Re-read `path` and report what changed since the last snapshot.
    async fn examine(&self, path: &Path) {
        if is_missing(path).await {
            let seen = self
                .inner
                .tracked
                .lock()
                .get(path)
                .is_some_and(|t| t.seen);
            if seen {
                self.forget(path);
            }
            return;
        }

        let id = self.inner.resolver.resolve(path);
        if !self.inner.debouncer.admit(&id, Instant::now()) {
            tracing::trace!(path = %path.display(), "Tick suppressed");
            self.inner.stats.suppressed();
            return;
        }

        let lines = match self.inner.reader.read(path).await {
            Ok(lines) => lines,
            Err(e) => {
                self.read_failed(&id, path, &e);
                return;
            }
        };

        let previous = self.claim_identity(path, &id);
        if !previous.is_some_and(|t| t.seen) {
            self.report(Report::FileCreated {
                id: id.clone(),
                path: path.to_path_buf(),
            });
            self.inner.stats.created();
        }

        let snapshot = self.inner.store.get(&id);
        if snapshot.as_ref().is_some_and(|s| s.matches(&lines)) {
            self.inner.stats.examined(false);
            return;
        }

        let changes = self
            .inner
            .diff_mode
            .diff(snapshot.as_ref().map_or(&[][..], Snapshot::lines), &lines);
        self.inner.store.put(Snapshot::observed(id.clone(), lines));
        self.inner.stats.examined(!changes.is_empty());

        if !changes.is_empty() {
            tracing::debug!(path = %path.display(), changes = changes.len(), "File changed");
            self.inner.stats.changeset(&changes);
            self.report(Report::Changed {
                id,
                path: path.to_path_buf(),
                changes,
            });
        }

        self.enforce_eviction();
    }

    /// Record `id` as the identity of `path`, moving its snapshot along.
    ///
    /// File ids are recycled: after replace-by-rename saves, `id` may still
    /// be tracked for another watched path whose file has since been
    /// replaced. That path's snapshot is parked under its path identity
    /// first, so each identity keeps belonging to one path and the other
    /// file is rekeyed from the parked entry on its next examination.
    ///
    /// Returns what was tracked for `path` before.
    fn claim_identity(&self, path: &Path, id: &FileIdentity) -> Option<Tracked> {
        let mut tracked = self.inner.tracked.lock();

        for (other, entry) in tracked.iter_mut() {
            if other != path && entry.id == *id {
                let parked = path_identity(other);
                tracing::debug!(
                    path = %other.display(),
                    stale = %id,
                    "File id reused by another watched file"
                );
                self.inner.store.rekey(id, parked.clone());
                entry.id = parked;
            }
        }

        let previous = tracked.insert(
            path.to_path_buf(),
            Tracked {
                id: id.clone(),
                seen: true,
            },
        );

        if let Some(old_id) = previous.as_ref().map(|t| &t.id).filter(|old| *old != id) {
            tracing::debug!(
                path = %path.display(),
                from = %old_id,
                to = %id,
                "File identity changed"
            );
            self.inner.store.rekey(old_id, id.clone());
            self.inner.debouncer.forget(old_id);
        }

        previous
    }

    /// Drop everything known about `path` and report it deleted.
    ///
    /// Only the caller that actually removes the tracking entry reports, so
    /// a deletion seen by several sources is announced once.
    pub fn forget(&self, path: &Path) {
        let Some(tracked) = self.inner.tracked.lock().remove(path) else {
            return;
        };

        self.inner.debouncer.forget(&tracked.id);
        self.inner.store.remove(&tracked.id);
        metrics::SNAPSHOTS_STORED.set(gauge_value(self.inner.store.len()));

        if tracked.seen {
            tracing::debug!(path = %path.display(), "Watched file deleted");
            self.inner.stats.deleted();
            self.report(Report::FileDeleted {
                id: tracked.id,
                path: path.to_path_buf(),
            });
        }
    }

    /// Run `sources` into this engine until `cancel` fires.
    ///
    /// Every tick is handled on its own task. On cancellation the sources
    /// are stopped and in-flight examinations drain before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be started or every source
    /// stopped on its own.
    pub async fn run(&self, sources: &[EventSource], cancel: CancellationToken) -> Result<()> {
        let span = spans::session_span(
            &self.inner.session_id.to_string(),
            self.inner.watch_set.base(),
        );
        self.run_sources(sources, cancel).instrument(span).await
    }

    async fn run_sources(&self, sources: &[EventSource], cancel: CancellationToken) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);

        let mut running = Vec::with_capacity(sources.len());
        for source in sources {
            match source.start(&self.inner.watch_set, tx.clone(), &cancel) {
                Ok(started) => {
                    tracing::info!(source = source.name(), "Event source started");
                    running.push(started);
                }
                Err(e) => {
                    for started in running {
                        started.stop().await;
                    }
                    return Err(e);
                }
            }
        }
        drop(tx);

        let tracker = TaskTracker::new();
        let result = loop {
            tokio::select! {
                () = cancel.cancelled() => break Ok(()),
                tick = rx.recv() => {
                    let Some(tick) = tick else {
                        break Err(WatcherError::ChannelClosed.into());
                    };
                    let span = spans::file_span(&tick.path, tick.origin.as_str());
                    let engine = self.clone();
                    tracker.spawn(async move { engine.handle_tick(tick).await }.instrument(span));
                }
            }
        };

        drop(rx);
        for source in running {
            source.stop().await;
        }
        tracker.close();
        tracker.wait().await;

        tracing::info!(stats = ?self.inner.stats.snapshot(), "Watch session finished");
        result
    }

    fn read_failed(&self, id: &FileIdentity, path: &Path, err: &ReadError) {
        tracing::warn!(path = %path.display(), error = %err, "Read failed, keeping previous snapshot");
        self.inner.stats.read_failed(err);
        self.report(Report::ReadFailed {
            id: id.clone(),
            path: path.to_path_buf(),
            attempts: err.attempts(),
            reason: err.to_string(),
        });
    }

    fn enforce_eviction(&self) {
        let evicted = self.inner.eviction.enforce(&self.inner.store);
        if !evicted.is_empty() {
            self.inner.stats.evicted(evicted.len());
        }
        metrics::SNAPSHOTS_STORED.set(gauge_value(self.inner.store.len()));
    }

    fn report(&self, report: Report) {
        self.inner.reporter.notify(report);
    }
}

async fn is_missing(path: &Path) -> bool {
    matches!(tokio::fs::try_exists(path).await, Ok(false))
}

fn gauge_value(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChangeEvent, ChannelReporter};
    use crate::storage::EvictionMode;
    use crate::watcher::{IdentityStrategy, LineSource, TickOrigin};
    use std::fs;
    use std::io;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn config(dir: &Path, files: &[&str]) -> Config {
        Config {
            directory: dir.to_path_buf(),
            files: files.iter().map(|f| (*f).to_string()).collect(),
            debounce: Duration::ZERO,
            retry_delay: Duration::from_millis(1),
            identity: IdentityStrategy::Path,
            ..Config::default()
        }
    }

    fn engine(config: &Config) -> (Engine, UnboundedReceiver<Report>) {
        let (reporter, rx) = ChannelReporter::new();
        (Engine::new(config, Arc::new(reporter)), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Report>) -> Vec<Report> {
        let mut out = Vec::new();
        while let Ok(report) = rx.try_recv() {
            out.push(report);
        }
        out
    }

    async fn examine(engine: &Engine, path: &Path) {
        engine
            .handle_tick(Tick::examine(path, TickOrigin::Poll))
            .await;
    }

    #[tokio::test]
    async fn test_prime_snapshots_every_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt", "b.txt"]));

        engine.prime().await;

        assert_eq!(engine.store().len(), 2);
        let a = engine.identity_of(&tmp.path().join("a.txt")).unwrap();
        assert_eq!(engine.store().get(&a).unwrap().lines(), &["x".to_string()]);
        let b = engine.identity_of(&tmp.path().join("b.txt")).unwrap();
        assert!(engine.store().get(&b).unwrap().is_placeholder());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_append_reports_added_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        fs::write(&path, "x\ny\n").unwrap();
        examine(&engine, &path).await;

        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 1);
        match &reports[0] {
            Report::Changed { changes, .. } => assert_eq!(
                changes,
                &vec![ChangeEvent::Added {
                    line: "y".to_string(),
                    index: 1
                }]
            ),
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unchanged_content_is_silent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        examine(&engine, &path).await;
        examine(&engine, &path).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(engine.stats().snapshot().unchanged, 2);
    }

    #[tokio::test]
    async fn test_created_file_reports_creation_then_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        fs::write(&path, "hello\n").unwrap();
        examine(&engine, &path).await;

        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0], Report::FileCreated { .. }));
        assert!(matches!(&reports[1], Report::Changed { changes, .. } if changes.len() == 1));
        assert_eq!(engine.store().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_placeholder_is_not_deleted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        examine(&engine, &path).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(engine.store().len(), 1);
    }

    #[tokio::test]
    async fn test_deletion_reported_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;
        examine(&engine, &path).await;
        let id = engine.identity_of(&path).unwrap();
        assert!(engine.debouncer().contains(&id));

        fs::remove_file(&path).unwrap();
        engine
            .handle_tick(Tick::removed(&path, TickOrigin::Notify))
            .await;
        examine(&engine, &path).await;
        engine
            .handle_tick(Tick::removed(&path, TickOrigin::Notify))
            .await;

        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0], Report::FileDeleted { .. }));
        assert!(engine.store().is_empty());
        assert!(!engine.debouncer().contains(&id));
        assert_eq!(engine.stats().snapshot().deleted, 1);
    }

    #[tokio::test]
    async fn test_poll_detects_deletion() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        fs::remove_file(&path).unwrap();
        examine(&engine, &path).await;
        examine(&engine, &path).await;

        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0], Report::FileDeleted { .. }));
        assert!(engine.identity_of(&path).is_none());
    }

    #[tokio::test]
    async fn test_debounce_suppresses_burst() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let mut config = config(tmp.path(), &["a.txt"]);
        config.debounce = Duration::from_secs(60);
        let (engine, _rx) = engine(&config);
        engine.prime().await;

        examine(&engine, &path).await;
        examine(&engine, &path).await;
        examine(&engine, &path).await;

        let stats = engine.stats().snapshot();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.suppressed, 2);
        assert_eq!(stats.examined, 1);
    }

    #[tokio::test]
    async fn test_unwatched_tick_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        let other = tmp.path().join("other.txt");
        fs::write(&other, "x\n").unwrap();
        examine(&engine, &other).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(engine.stats().snapshot().ticks, 0);
    }

    struct LockedSource;

    impl LineSource for LockedSource {
        fn read_lines(&self, _path: &Path) -> io::Result<Vec<String>> {
            Err(io::Error::from(io::ErrorKind::WouldBlock))
        }
    }

    #[tokio::test]
    async fn test_read_failure_keeps_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let config = config(tmp.path(), &["a.txt"]);
        let (engine, mut rx) = engine(&config);
        engine.prime().await;
        let id = engine.identity_of(&path).unwrap();

        let (reporter, mut locked_rx) = ChannelReporter::new();
        let locked = Engine::with_reader(
            &config,
            Arc::new(reporter),
            RetryingReader::with_source(Arc::new(LockedSource), 3, Duration::from_millis(1)),
        );
        locked.prime().await;
        fs::write(&path, "x\ny\n").unwrap();
        examine(&locked, &path).await;

        let reports = drain(&mut locked_rx);
        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(matches!(report, Report::ReadFailed { attempts: 3, .. }));
        }
        assert!(locked.store().get(&id).unwrap().lines().is_empty());
        assert_eq!(locked.stats().snapshot().read_failures, 2);

        // The healthy engine is unaffected and still sees the change.
        examine(&engine, &path).await;
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_eviction_bounds_store() {
        let tmp = TempDir::new().unwrap();
        let names: Vec<String> = (0..12).map(|i| format!("f{i}.txt")).collect();
        for name in &names {
            fs::write(tmp.path().join(name), "x\n").unwrap();
        }
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut config = config(tmp.path(), &refs);
        config.eviction_mode = EvictionMode::LeastRecent;
        let (engine, _rx) = engine(&config);

        engine.prime().await;

        assert!(engine.store().len() <= config.eviction_threshold);
        assert!(engine.stats().snapshot().evicted >= 5);
    }

    #[tokio::test]
    async fn test_evicted_file_rediffs_against_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        let id = engine.identity_of(&path).unwrap();
        engine.store().remove(&id);
        examine(&engine, &path).await;

        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 1);
        assert!(matches!(&reports[0], Report::Changed { changes, .. } if changes.len() == 1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_replaced_file_is_rekeyed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let mut config = config(tmp.path(), &["a.txt"]);
        config.identity = IdentityStrategy::Platform;
        let (engine, mut rx) = engine(&config);
        engine.prime().await;
        let before = engine.identity_of(&path).unwrap();

        let staged = tmp.path().join("a.txt.tmp");
        fs::write(&staged, "x\ny\n").unwrap();
        fs::rename(&staged, &path).unwrap();
        examine(&engine, &path).await;

        let after = engine.identity_of(&path).unwrap();
        assert_ne!(before, after);
        assert_eq!(engine.store().len(), 1);
        assert!(!engine.store().contains(&before));
        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 1);
        assert!(matches!(&reports[0], Report::Changed { changes, .. } if changes.len() == 1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reused_file_id_keeps_each_snapshot() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, "alpha\n").unwrap();
        fs::write(&b, "bravo\n").unwrap();
        let mut config = config(tmp.path(), &["a.txt", "b.txt"]);
        config.identity = IdentityStrategy::Platform;
        let (engine, mut rx) = engine(&config);
        engine.prime().await;
        let first_a = engine.identity_of(&a).unwrap();

        // Save both files by replace-and-rename, with b landing on the
        // file a used to have.
        let held = tmp.path().join("held");
        fs::hard_link(&a, &held).unwrap();
        let staged = tmp.path().join("a.txt.tmp");
        fs::write(&staged, "alpha\n").unwrap();
        fs::rename(&staged, &a).unwrap();
        fs::write(&held, "bravo\n").unwrap();
        fs::rename(&held, &b).unwrap();

        examine(&engine, &b).await;
        examine(&engine, &a).await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(engine.identity_of(&b), Some(first_a));
        assert_ne!(engine.identity_of(&a), engine.identity_of(&b));
        assert_eq!(engine.store().len(), 2);
        assert_eq!(engine.stats().snapshot().changesets, 0);

        fs::write(&a, "alpha\nagain\n").unwrap();
        examine(&engine, &a).await;
        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 1);
        assert!(matches!(
            &reports[0],
            Report::Changed { changes, .. } if changes == &vec![ChangeEvent::Added {
                line: "again".to_string(),
                index: 1,
            }]
        ));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "x\n").unwrap();
        let (engine, mut rx) = engine(&config(tmp.path(), &["a.txt"]));
        engine.prime().await;

        let cancel = CancellationToken::new();
        let sources = [EventSource::Poll {
            interval: Duration::from_millis(20),
        }];
        let runner = {
            let engine = engine.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { engine.run(&sources, cancel).await })
        };

        fs::write(&path, "x\ny\n").unwrap();
        let report = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(report, Report::Changed { .. }));

        cancel.cancel();
        runner.await.unwrap().unwrap();
        assert!(engine.stats().snapshot().ticks >= 1);
    }
}
