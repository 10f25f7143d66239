//! JSON configuration file format.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::DiffMode;
use crate::storage::EvictionMode;
use crate::watcher::IdentityStrategy;
use crate::{Error, Result};

/// On-disk configuration record.
///
/// Only `DirectoryPath` and `FilesToMonitor` are required; every tuning key
/// falls back to the session defaults when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WatchFile {
    pub directory_path: PathBuf,
    pub files_to_monitor: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_threshold: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_batch: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_mode: Option<EvictionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_mode: Option<DiffMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityStrategy>,
}

impl WatchFile {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "cannot read configuration file '{}': {e}",
                path.display()
            ))
        })?;
        Self::parse(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse configuration JSON.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON does not match the record.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::config(format!("invalid configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal() {
        let file = WatchFile::parse(
            r#"{ "DirectoryPath": "C:\\temp\\TEST", "FilesToMonitor": ["a.txt", "b.txt"] }"#,
        )
        .unwrap();
        assert_eq!(file.directory_path, PathBuf::from("C:\\temp\\TEST"));
        assert_eq!(file.files_to_monitor, vec!["a.txt", "b.txt"]);
        assert!(file.poll_interval_ms.is_none());
        assert!(file.eviction_mode.is_none());
    }

    #[test]
    fn test_parse_tuning_keys() {
        let file = WatchFile::parse(
            r#"{
                "DirectoryPath": "/srv",
                "FilesToMonitor": ["a.txt"],
                "PollIntervalMs": 30000,
                "Notify": false,
                "EvictionMode": "least-recent",
                "DiffMode": "lcs",
                "Identity": "path"
            }"#,
        )
        .unwrap();
        assert_eq!(file.poll_interval_ms, Some(30_000));
        assert_eq!(file.notify, Some(false));
        assert_eq!(file.eviction_mode, Some(EvictionMode::LeastRecent));
        assert_eq!(file.diff_mode, Some(DiffMode::Lcs));
        assert_eq!(file.identity, Some(IdentityStrategy::Path));
    }

    #[test]
    fn test_parse_missing_required_field() {
        let err = WatchFile::parse(r#"{ "DirectoryPath": "/srv" }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("FilesToMonitor"));
    }

    #[test]
    fn test_load_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{ "DirectoryPath": "/srv", "FilesToMonitor": ["x.txt"] }"#,
        )
        .unwrap();

        let file = WatchFile::load(&path).unwrap();
        assert_eq!(file.files_to_monitor, vec!["x.txt"]);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = WatchFile::load(tmp.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read configuration file"));
    }
}
