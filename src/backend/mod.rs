//! # Backend Pool Module
//!
//! Defines the backend servers the balancer dispatches to: their identity,
//! class, connection handle, and live/retired status, plus the registry that
//! owns them ([`registry::BackendRegistry`]).

pub mod registry;

pub use registry::BackendRegistry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Shared handle to a backend's persistent connection
///
/// Each backend has exactly one stream, established at startup. The async
/// mutex serializes exchanges so the backend sees at most one in-flight
/// request/response at a time.
pub type BackendHandle = Arc<Mutex<TcpStream>>;

/// The class of work a backend is provisioned for
///
/// The class tag determines the backend's cost profile: the scheduler looks
/// up `(class, request tag)` in the cost table when estimating durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendClass {
    Video,
    Music,
}

impl fmt::Display for BackendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendClass::Video => write!(f, "VIDEO"),
            BackendClass::Music => write!(f, "MUSIC"),
        }
    }
}

/// Lifecycle status of a backend
///
/// The only transition is `Active -> Retired`, taken when an exchange with
/// the backend fails. It is never reversed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Active,
    Retired,
}

/// One configured backend server
///
/// Created at startup from static configuration and mutated only by the
/// [`BackendRegistry`] (retirement). The name is the stable key used by the
/// scheduler and the completion-time tracker.
#[derive(Debug)]
pub struct Backend {
    name: String,
    addr: String,
    class: BackendClass,
    status: BackendStatus,
    handle: Option<BackendHandle>,
}

impl Backend {
    /// Create a backend wrapping an established connection
    pub fn connected(name: String, addr: String, class: BackendClass, stream: TcpStream) -> Self {
        Self {
            name,
            addr,
            class,
            status: BackendStatus::Active,
            handle: Some(Arc::new(Mutex::new(stream))),
        }
    }

    /// Create a backend with no live connection, for scheduling-only tests
    #[cfg(test)]
    pub(crate) fn detached(name: &str, class: BackendClass) -> Self {
        Self {
            name: name.to_string(),
            addr: String::new(),
            class,
            status: BackendStatus::Active,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn class(&self) -> BackendClass {
        self.class
    }

    pub fn status(&self) -> BackendStatus {
        self.status
    }

    /// Clone the connection handle, if the backend still holds one
    pub fn handle(&self) -> Option<BackendHandle> {
        self.handle.clone()
    }

    /// Transition to `Retired` and release the connection handle
    pub(crate) fn retire(&mut self) {
        self.status = BackendStatus::Retired;
        self.handle = None;
    }
}
