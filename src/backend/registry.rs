//! Backend registry: the ordered, mutable view of the backend pool.

use tracing::info;

use super::{Backend, BackendStatus};

/// The set of known backends, in configuration order
///
/// Iteration order is the explicit insertion order, never incidental map
/// order, so the scheduler's first-wins tie-break is reproducible across
/// runs. The registry itself is not synchronized; the scheduler wraps it
/// (together with the completion-time tracker) in a single mutex so that a
/// scheduling decision never interleaves with another decision or with a
/// retirement.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: Vec<Backend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend to the pool. Registration happens only at startup.
    pub fn register(&mut self, backend: Backend) {
        self.backends.push(backend);
    }

    /// Snapshot of all active backends, in configuration order
    pub fn list_active(&self) -> impl Iterator<Item = &Backend> {
        self.backends
            .iter()
            .filter(|b| b.status() == BackendStatus::Active)
    }

    /// Look up a backend by name regardless of status
    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name() == name)
    }

    /// Retire the named backend, releasing its connection handle
    ///
    /// Idempotent; retiring an unknown or already-retired name is a no-op.
    /// Once retired, the backend never reappears in `list_active`.
    pub fn retire(&mut self, name: &str) {
        if let Some(backend) = self
            .backends
            .iter_mut()
            .find(|b| b.name() == name && b.status() == BackendStatus::Active)
        {
            backend.retire();
            info!(backend = name, addr = backend.addr(), "Backend retired from pool");
        }
    }

    /// True when no backend is active
    pub fn is_empty(&self) -> bool {
        self.list_active().next().is_none()
    }

    /// Number of active backends
    pub fn active_count(&self) -> usize {
        self.list_active().count()
    }
}
