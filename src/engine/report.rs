//! Change notifications and the sinks that receive them.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::mpsc;

use super::diff::ChangeEvent;
use crate::watcher::FileIdentity;

/// What the engine tells the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A watched file appeared.
    FileCreated { id: FileIdentity, path: PathBuf },
    /// A watched file disappeared; its snapshot is gone.
    FileDeleted { id: FileIdentity, path: PathBuf },
    /// The file's content changed.
    Changed {
        id: FileIdentity,
        path: PathBuf,
        changes: Vec<ChangeEvent>,
    },
    /// The file could not be read; its snapshot was kept.
    ReadFailed {
        id: FileIdentity,
        path: PathBuf,
        attempts: u32,
        reason: String,
    },
}

impl Report {
    #[must_use]
    pub const fn id(&self) -> &FileIdentity {
        match self {
            Self::FileCreated { id, .. }
            | Self::FileDeleted { id, .. }
            | Self::Changed { id, .. }
            | Self::ReadFailed { id, .. } => id,
        }
    }

    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::FileCreated { path, .. }
            | Self::FileDeleted { path, .. }
            | Self::Changed { path, .. }
            | Self::ReadFailed { path, .. } => path,
        }
    }

    /// Render as human-readable status lines.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let path = self.path().display();
        match self {
            Self::FileCreated { .. } => vec![format!("created: {path}")],
            Self::FileDeleted { .. } => vec![format!("deleted: {path}")],
            Self::ReadFailed {
                attempts, reason, ..
            } => vec![format!(
                "read failed: {path} (after {attempts} attempt(s)): {reason}"
            )],
            Self::Changed { changes, .. } => {
                let mut out = Vec::with_capacity(changes.len() + 1);
                out.push(format!("changed: {path}"));
                out.extend(changes.iter().map(render_change));
                out
            }
        }
    }
}

fn render_change(change: &ChangeEvent) -> String {
    match change {
        ChangeEvent::Added { line, index } => format!("  added line {index}: {line}"),
        ChangeEvent::Removed { line, index } => format!("  removed line {index}: {line}"),
        ChangeEvent::Modified { old, new, index } => {
            format!("  modified line {index}: '{old}' -> '{new}'")
        }
    }
}

/// Receives reports from the engine.
///
/// Called from many tasks at once; implementations must not block for long.
pub trait ChangeReporter: Send + Sync {
    fn notify(&self, report: Report);
}

/// Prints reports to stdout as timestamped status lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    fn stamp(at: DateTime<Local>) -> String {
        at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }

    /// Write every status line of `report` to `out`, each prefixed by `stamp`.
    fn write_report(out: &mut impl Write, stamp: &str, report: &Report) -> io::Result<()> {
        for line in report.render() {
            writeln!(out, "[{stamp}] {line}")?;
        }
        out.flush()
    }
}

impl ChangeReporter for ConsoleReporter {
    fn notify(&self, report: Report) {
        let stamp = Self::stamp(Local::now());
        // One lock per report keeps its lines together when files change at once.
        let mut stdout = io::stdout().lock();
        if let Err(e) = Self::write_report(&mut stdout, &stamp, &report) {
            tracing::warn!(error = %e, path = %report.path().display(), "Failed to print report");
        }
    }
}

/// Forwards reports into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<Report>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Report>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ChangeReporter for ChannelReporter {
    fn notify(&self, report: Report) {
        if self.tx.send(report).is_err() {
            tracing::debug!("Report receiver dropped");
        }
    }
}

/// JSON form of a report, one object per line for downstream tooling.
#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    event: &'static str,
    id: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<&'a [ChangeEvent]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl Report {
    /// Serialize as a single JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut record = ReportRecord {
            event: "",
            id: self.id().to_string(),
            path: self.path().display().to_string(),
            changes: None,
            attempts: None,
            reason: None,
        };
        match self {
            Self::FileCreated { .. } => record.event = "file_created",
            Self::FileDeleted { .. } => record.event = "file_deleted",
            Self::Changed { changes, .. } => {
                record.event = "changed";
                record.changes = Some(changes.as_slice());
            }
            Self::ReadFailed {
                attempts, reason, ..
            } => {
                record.event = "read_failed";
                record.attempts = Some(*attempts);
                record.reason = Some(reason.as_str());
            }
        }
        serde_json::to_string(&record)
    }
}

/// Prints reports to stdout as JSON lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl ChangeReporter for JsonReporter {
    fn notify(&self, report: Report) {
        match report.to_json() {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize report"),
        }
    }
}
