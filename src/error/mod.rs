//! Error types and Result aliases for linewatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using linewatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for linewatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Event source error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Reading a watched file failed.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Event source errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The tick channel was closed before the source stopped.
    #[error("tick channel closed")]
    ChannelClosed,
}

/// Errors produced while reading a watched file.
///
/// Neither variant is fatal: the caller reports it and keeps the previous
/// snapshot.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The file stayed locked or busy for every attempt.
    #[error("'{path}' still unavailable after {attempts} attempts: {reason}")]
    Transient {
        path: String,
        attempts: u32,
        reason: String,
    },

    /// The file cannot be read at all (permissions, removed, not text).
    #[error("failed to read '{path}': {reason}")]
    Permanent { path: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl ReadError {
    /// Number of read attempts made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Transient { attempts, .. } => *attempts,
            Self::Permanent { .. } => 1,
        }
    }

    /// Whether the failure was a lock/busy condition rather than a hard error.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Short label used for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transient { .. } => "transient",
            Self::Permanent { .. } => "permanent",
        }
    }
}
