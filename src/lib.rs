//! Linewatch Library
//!
//! Line-level change detection for a fixed set of text files in one directory.
//!
//! An [`engine::Engine`] keeps a snapshot of every watched file, re-reads a
//! file whenever a poll or OS notification says it may have changed, and
//! reports which lines were added, removed or modified.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod storage;
pub mod telemetry;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
