//! Configuration management for linewatch.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - JSON configuration file (lowest priority)

mod file;
mod settings;

pub use file::WatchFile;
pub use settings::{
    Config, DEFAULT_DEBOUNCE, DEFAULT_EVICTION_BATCH, DEFAULT_EVICTION_THRESHOLD,
    DEFAULT_POLL_INTERVAL, DEFAULT_READ_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
