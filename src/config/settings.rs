//! Configuration settings and validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::file::WatchFile;
use crate::engine::DiffMode;
use crate::storage::EvictionMode;
use crate::watcher::{EventSource, IdentityStrategy};
use crate::{Error, Result};

/// Default interval between full polls of the watch set.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default window during which repeated ticks for one file are dropped.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default number of read attempts for a locked file.
pub const DEFAULT_READ_ATTEMPTS: u32 = 3;

/// Default delay between read attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Default snapshot count above which eviction kicks in.
pub const DEFAULT_EVICTION_THRESHOLD: usize = 10;

/// Default number of snapshots dropped per eviction.
pub const DEFAULT_EVICTION_BATCH: usize = 5;

/// Main configuration for a watch session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory the watch set is resolved against.
    pub directory: PathBuf,

    /// File names to monitor, relative to `directory`.
    pub files: Vec<String>,

    /// Poll interval; `None` disables the poller.
    pub poll_interval: Option<Duration>,

    /// Subscribe to OS change notifications for `directory`.
    pub notify: bool,

    /// Debounce window per file.
    pub debounce: Duration,

    /// Read attempts before a locked file is reported as failed.
    pub read_attempts: u32,

    /// Delay between read attempts.
    pub retry_delay: Duration,

    /// Snapshot count above which eviction runs.
    pub eviction_threshold: usize,

    /// Snapshots dropped per eviction.
    pub eviction_batch: usize,

    /// How eviction picks its victims.
    pub eviction_mode: EvictionMode,

    /// Line diff strategy.
    pub diff_mode: DiffMode,

    /// How watched files are keyed.
    pub identity: IdentityStrategy,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            files: Vec::new(),
            poll_interval: Some(DEFAULT_POLL_INTERVAL),
            notify: true,
            debounce: DEFAULT_DEBOUNCE,
            read_attempts: DEFAULT_READ_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
            eviction_batch: DEFAULT_EVICTION_BATCH,
            eviction_mode: EvictionMode::default(),
            diff_mode: DiffMode::default(),
            identity: IdentityStrategy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Build a configuration from a parsed configuration file, filling
    /// unspecified tuning values with defaults.
    #[must_use]
    pub fn from_watch_file(file: WatchFile) -> Self {
        let defaults = Self::default();
        Self {
            directory: file.directory_path,
            files: file.files_to_monitor,
            poll_interval: file
                .poll_interval_ms
                .map_or(defaults.poll_interval, |ms| Some(Duration::from_millis(ms))),
            notify: file.notify.unwrap_or(defaults.notify),
            debounce: file
                .debounce_ms
                .map_or(defaults.debounce, Duration::from_millis),
            read_attempts: file.read_attempts.unwrap_or(defaults.read_attempts),
            retry_delay: file
                .retry_delay_ms
                .map_or(defaults.retry_delay, Duration::from_millis),
            eviction_threshold: file
                .eviction_threshold
                .unwrap_or(defaults.eviction_threshold),
            eviction_batch: file.eviction_batch.unwrap_or(defaults.eviction_batch),
            eviction_mode: file.eviction_mode.unwrap_or(defaults.eviction_mode),
            diff_mode: file.diff_mode.unwrap_or(defaults.diff_mode),
            identity: file.identity.unwrap_or(defaults.identity),
            log_level: defaults.log_level,
        }
    }

    /// Load a JSON configuration file and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        WatchFile::load(path).map(Self::from_watch_file)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::config("FilesToMonitor cannot be empty"));
        }

        let mut seen = HashSet::new();
        for name in &self.files {
            validate_file_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(Error::config(format!(
                    "file '{name}' is listed more than once"
                )));
            }
        }

        if self.poll_interval.is_none() && !self.notify {
            return Err(Error::config(
                "at least one event source (poll or notify) must be enabled",
            ));
        }

        if self.poll_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(Error::config("poll interval cannot be 0"));
        }

        if self.read_attempts == 0 {
            return Err(Error::config("read_attempts cannot be 0"));
        }

        if self.eviction_batch == 0 {
            return Err(Error::config("eviction_batch cannot be 0"));
        }

        if self.eviction_batch > self.eviction_threshold {
            return Err(Error::config(format!(
                "eviction_batch ({}) cannot exceed eviction_threshold ({})",
                self.eviction_batch, self.eviction_threshold
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Event sources enabled by this configuration.
    #[must_use]
    pub fn event_sources(&self) -> Vec<EventSource> {
        let mut sources = Vec::with_capacity(2);
        if let Some(interval) = self.poll_interval {
            sources.push(EventSource::Poll { interval });
        }
        if self.notify {
            sources.push(EventSource::Notify);
        }
        sources
    }
}

/// A watched name must stay inside the base directory.
fn validate_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::config("file names cannot be empty"));
    }

    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    );

    if !single_normal || name.contains('/') || name.contains('\\') {
        return Err(Error::config(format!(
            "file '{name}' must be a plain file name inside the watch directory"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            files: vec!["a.txt".to_string(), "b.log".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Some(Duration::from_secs(5)));
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.read_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(100));
        assert_eq!(config.eviction_threshold, 10);
        assert_eq!(config.eviction_batch, 5);
        assert!(config.notify);
    }

    #[test]
    fn test_default_config_needs_files() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("FilesToMonitor"));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nested_names() {
        for name in ["../escape.txt", "sub/dir.txt", "..", ".", "/abs.txt", "a\\b.txt", " "] {
            let config = Config {
                files: vec![name.to_string()],
                ..Default::default()
            };
            assert!(config.validate().is_err(), "'{name}' should be rejected");
        }
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = Config {
            files: vec!["a.txt".to_string(), "a.txt".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_validate_requires_a_source() {
        let config = Config {
            poll_interval: None,
            notify: false,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("event source"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let config = Config {
            poll_interval: Some(Duration::ZERO),
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll interval"));
    }

    #[test]
    fn test_validate_zero_attempts() {
        let config = Config {
            read_attempts: 0,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("read_attempts"));
    }

    #[test]
    fn test_validate_eviction_bounds() {
        let config = Config {
            eviction_batch: 0,
            ..valid()
        };
        assert!(config.validate().is_err());

        let config = Config {
            eviction_threshold: 3,
            eviction_batch: 4,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..valid()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }

        let config = Config {
            log_level: "loud".to_string(),
            ..valid()
        };
        assert!(config.validate().unwrap_err().to_string().contains("log level"));
    }

    #[test]
    fn test_event_sources() {
        let config = valid();
        assert_eq!(
            config.event_sources(),
            vec![
                EventSource::Poll {
                    interval: DEFAULT_POLL_INTERVAL
                },
                EventSource::Notify
            ]
        );

        let config = Config {
            poll_interval: None,
            ..valid()
        };
        assert_eq!(config.event_sources(), vec![EventSource::Notify]);
    }

    #[test]
    fn test_from_watch_file_applies_defaults() {
        let file: WatchFile = serde_json::from_str(
            r#"{"DirectoryPath": "/tmp/w", "FilesToMonitor": ["a.txt"], "DebounceMs": 50}"#,
        )
        .unwrap();
        let config = Config::from_watch_file(file);
        assert_eq!(config.directory, PathBuf::from("/tmp/w"));
        assert_eq!(config.files, vec!["a.txt".to_string()]);
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.poll_interval, Some(DEFAULT_POLL_INTERVAL));
        assert_eq!(config.read_attempts, DEFAULT_READ_ATTEMPTS);
    }
}
