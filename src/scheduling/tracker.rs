//! Completion-time tracker: when each backend is expected to be free.

use std::collections::HashMap;
use std::time::Instant;

/// Per-backend estimated time-of-availability
///
/// A plain map with no validation of its own; the scheduler's locking
/// discipline and finish-time formula (`max(now, current) + cost`) are what
/// keep each entry monotonically non-decreasing.
#[derive(Debug, Default)]
pub struct FinishTimeTracker {
    estimates: HashMap<String, Instant>,
}

impl FinishTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimated instant at which `name` becomes free; "now" if untracked
    pub fn get(&self, name: &str, now: Instant) -> Instant {
        self.estimates.get(name).copied().unwrap_or(now)
    }

    /// Commit a new finish-time estimate for `name`
    pub fn set(&mut self, name: &str, finish: Instant) {
        self.estimates.insert(name.to_string(), finish);
    }

    /// Drop the entry for a retired backend so it can never influence
    /// another decision
    pub fn remove(&mut self, name: &str) {
        self.estimates.remove(name);
    }
}
