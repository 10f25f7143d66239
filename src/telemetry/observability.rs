//! Structured logging and tracing configuration.
//!
//! Diagnostics go to stderr so that stdout stays free for change reports:
//! - Structured logging with JSON output option
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Spans for watch sessions and per-file examinations

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Initialize tracing with the given configuration.
///
/// This sets up:
/// - Environment-based filtering (`RUST_LOG` wins over `config.level`)
/// - Pretty or JSON output on stderr, keeping stdout for reports
///
/// # Arguments
///
/// * `config` - Level and output format
///
/// # Panics
///
/// Panics if tracing subscriber has already been initialized in this process.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!(
        "Tracing initialized: level={}, json={}",
        config.level,
        config.json
    );
}

/// Span constructors shared by the engine.
pub mod spans {
    use std::path::Path;

    use tracing::{info_span, Span};

    /// Span covering one watch session.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Engine session id
    /// * `directory` - Watched base directory
    ///
    /// # Returns
    ///
    /// A span that every tick of the session runs inside
    #[must_use]
    pub fn session_span(session_id: &str, directory: &Path) -> Span {
        info_span!(
            "session",
            session = %session_id,
            directory = %directory.display(),
        )
    }

    /// Span covering one tick's handling for one file.
    ///
    /// # Arguments
    ///
    /// * `path` - Watched file being examined
    /// * `origin` - Source of the tick (poll or notify)
    ///
    /// # Returns
    ///
    /// A new tracing span for this examination
    #[must_use]
    pub fn file_span(path: &Path, origin: &str) -> Span {
        info_span!(
            "examine",
            path = %path.display(),
            origin = %origin,
        )
    }
}
