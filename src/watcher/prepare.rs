//! Watch directory preparation.
//!
//! Creates the base directory and an empty placeholder for every watched
//! file that does not exist yet, so notifications have something to attach
//! to from the first second.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;

use super::watch_set::WatchSet;
use crate::Result;

/// What preparation had to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareReport {
    /// The base directory did not exist and was created.
    pub directory_created: bool,
    /// Placeholder files created, in watch-set order.
    pub files_created: Vec<PathBuf>,
}

/// Create the watch directory and any missing watched files.
///
/// Existing files are never touched.
///
/// # Errors
///
/// Returns an error if the directory or a placeholder cannot be created.
pub fn prepare_watch_dir(watch_set: &WatchSet) -> Result<PrepareReport> {
    let mut report = PrepareReport::default();
    let base = watch_set.base();

    if !base.is_dir() {
        fs::create_dir_all(base)?;
        report.directory_created = true;
        tracing::info!(path = %base.display(), "Created watch directory");
    }

    for path in watch_set.paths() {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => {
                tracing::info!(path = %path.display(), "Created placeholder file");
                report.files_created.push(path.clone());
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }
    }

    for path in watch_set.paths() {
        tracing::info!(path = %path.display(), "Monitoring file");
    }

    Ok(report)
}
