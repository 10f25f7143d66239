//! In-memory snapshot storage.
//!
//! This module provides:
//! - Immutable per-file snapshots with content digests
//! - A concurrent snapshot store keyed by file identity
//! - The eviction policy that caps the store's size
//!
//! Nothing is persisted; snapshots live for one watch session.

mod eviction;
mod snapshot;

pub use eviction::{EvictionMode, EvictionPolicy};
pub use snapshot::{content_digest, Snapshot, SnapshotStore};
