//! File observation: what to watch, when to look, and how to read.
//!
//! This module provides:
//! - The watch set and stable file identities
//! - Poll and OS-notification tick sources
//! - The debounce gate shared by all sources
//! - Retrying line reads

mod debounce;
mod events;
mod identity;
mod poller;
mod prepare;
mod reader;
mod source;
mod watch_set;
#[allow(clippy::module_inception)]
mod watcher;

pub use debounce::Debouncer;
pub use events::{FileEvent, Tick, TickBatch, TickKind, TickOrigin};
pub use identity::{
    path_identity, platform_identity, FileIdentity, IdentityResolver, IdentityStrategy,
};
pub use poller::Poller;
pub use prepare::{prepare_watch_dir, PrepareReport};
pub use reader::{is_transient, split_lines, FsLineSource, LineSource, RetryingReader};
pub use source::{EventSource, RunningSource};
pub use watch_set::WatchSet;
pub use watcher::NotifyWatcher;
