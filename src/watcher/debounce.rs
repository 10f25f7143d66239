//! Leading-edge debounce gate for re-examination ticks.
//!
//! The first tick for a file is admitted and every further tick for the same
//! file within the suppress window is dropped. Poll and notify ticks share
//! one gate, so running both sources never doubles the work.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::identity::FileIdentity;

/// Per-identity admission gate.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Mutex<HashMap<FileIdentity, Instant>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Admit a tick for `id` observed at `now`.
    ///
    /// Check and update happen under one lock, so two concurrent ticks for
    /// the same file cannot both pass. A zero window admits everything.
    pub fn admit(&self, id: &FileIdentity, now: Instant) -> bool {
        let mut last_accepted = self.last_accepted.lock();
        if let Some(last) = last_accepted.get(id).filter(|_| !self.window.is_zero()) {
            // A tick older than the record (clock skew between callers) is a duplicate.
            let elapsed = now.saturating_duration_since(*last);
            if elapsed <= self.window {
                return false;
            }
        }
        last_accepted.insert(id.clone(), now);
        true
    }

    /// Drop the record for `id`.
    pub fn forget(&self, id: &FileIdentity) -> bool {
        self.last_accepted.lock().remove(id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &FileIdentity) -> bool {
        self.last_accepted.lock().contains_key(id)
    }

    /// Number of tracked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_accepted.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
