//! The fixed set of files a session monitors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Config;

/// File names resolved against one base directory.
///
/// Immutable once built; clone is cheap.
#[derive(Debug, Clone)]
pub struct WatchSet {
    base: PathBuf,
    paths: Arc<[PathBuf]>,
}

impl WatchSet {
    /// Resolve `names` against `base`.
    pub fn new<S: AsRef<str>>(base: impl Into<PathBuf>, names: &[S]) -> Self {
        let base = base.into();
        let paths = names.iter().map(|n| base.join(n.as_ref())).collect();
        Self { base, paths }
    }

    /// Build the watch set described by a configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.directory.clone(), &config.files)
    }

    /// Directory the watch set lives in.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Full paths of all watched files, in configuration order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Map a path reported by the OS onto its watch-set path.
    ///
    /// Notifications may spell the directory differently (symlinks,
    /// canonical prefixes), so only the file name is compared.
    #[must_use]
    pub fn lookup(&self, path: &Path) -> Option<&Path> {
        let name = path.file_name()?;
        self.paths
            .iter()
            .find(|p| p.file_name() == Some(name))
            .map(PathBuf::as_path)
    }

    /// Whether `path` names a watched file.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }
}
