//! Change detection.
//!
//! This module provides:
//! - Line-level diff strategies
//! - The engine that turns ticks into reports
//! - Report sinks
//! - Per-engine statistics

mod diff;
#[allow(clippy::module_inception)]
mod engine;
mod report;
mod stats;

pub use diff::{baseline_diff, lcs_diff, ChangeEvent, DiffMode};
pub use engine::Engine;
pub use report::{ChangeReporter, ChannelReporter, ConsoleReporter, JsonReporter, Report};
pub use stats::{EngineStats, EngineStatsSnapshot};
