//! Linewatch - line-level file change notifications
//!
//! Entry point for the linewatch command.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use linewatch::engine::{ChangeReporter, ConsoleReporter, Engine, JsonReporter};
use linewatch::telemetry::{init_metrics, init_tracing, render_metrics, TracingConfig};
use linewatch::watcher::{prepare_watch_dir, WatchSet};
use linewatch::{Config, Result};
use tokio_util::sync::CancellationToken;

/// Linewatch - report added, removed and modified lines in watched files
#[derive(Parser, Debug)]
#[command(name = "linewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file with `DirectoryPath` and `FilesToMonitor`
    #[arg(short, long, env = "LINEWATCH_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Override the watched directory
    #[arg(short, long, env = "LINEWATCH_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LINEWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "LINEWATCH_LOG_JSON")]
    log_json: bool,

    /// Poll interval in milliseconds
    #[arg(long, env = "LINEWATCH_POLL_MS")]
    poll_ms: Option<u64>,

    /// Disable OS change notifications
    #[arg(long, env = "LINEWATCH_NO_NOTIFY")]
    no_notify: bool,

    /// Disable polling
    #[arg(long, env = "LINEWATCH_NO_POLL", conflicts_with = "poll_ms")]
    no_poll: bool,

    /// Print reports as JSON lines instead of status lines
    #[arg(long, env = "LINEWATCH_JSON_REPORTS")]
    json_reports: bool,

    /// Print Prometheus metrics on exit
    #[arg(long, env = "LINEWATCH_PRINT_METRICS")]
    print_metrics: bool,
}

impl Cli {
    /// Load the configuration file and apply command-line overrides.
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config)?;

        if let Some(directory) = &self.directory {
            config.directory.clone_from(directory);
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval = Some(Duration::from_millis(ms));
        }
        if self.no_poll {
            config.poll_interval = None;
        }
        if self.no_notify {
            config.notify = false;
        }
        config.log_level.clone_from(&self.log_level);

        Ok(config)
    }
}

/// Cancel `cancel` on Ctrl-C or when `q` is entered on stdin.
fn spawn_shutdown_listeners(cancel: &CancellationToken) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            on_signal.cancel();
        }
    });

    // A plain thread: a blocking stdin read must not hold up runtime shutdown.
    let on_quit = cancel.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    tracing::info!("Quit requested, shutting down");
                    on_quit.cancel();
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "Stopped reading stdin");
                    return;
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    tracing::info!("Linewatch v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    init_metrics();

    let watch_set = WatchSet::from_config(&config);
    let prepared = prepare_watch_dir(&watch_set)?;
    tracing::debug!(?prepared, "Watch directory ready");

    let reporter: Arc<dyn ChangeReporter> = if cli.json_reports {
        Arc::new(JsonReporter)
    } else {
        Arc::new(ConsoleReporter)
    };

    let engine = Engine::new(&config, reporter);
    engine.prime().await;

    let cancel = CancellationToken::new();
    spawn_shutdown_listeners(&cancel);

    tracing::info!(
        session = %engine.session_id(),
        directory = %config.directory.display(),
        files = watch_set.len(),
        "Watching; enter 'q' or press Ctrl-C to stop"
    );

    engine.run(&config.event_sources(), cancel).await?;

    if cli.print_metrics {
        print!("{}", render_metrics());
    }

    Ok(())
}
