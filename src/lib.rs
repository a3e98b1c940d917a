//! # TCP Balancer Library
//!
//! A TCP request dispatcher that sits between clients and a small fixed pool
//! of typed backend servers, routing each request to the backend with the
//! least estimated completion time and relaying bytes in both directions.
//!
//! ## Architecture Overview
//!
//! The balancer is built from a handful of modules, leaves first:
//! - `core`: error types and configuration loading
//! - `backend`: the backend pool — identity, class, status, connection handles
//! - `scheduling`: the cost model, completion-time tracker, and LECT scheduler
//! - `session`: one request/response cycle between a client and its backend
//! - `dispatch`: the two interchangeable drivers (multiplexed, worker-per-connection)
//!
//! The scheduling/session core exists exactly once; the dispatch strategies
//! are thin adapters over it, so both produce identical decisions.

/// Error types and configuration
pub mod core;

/// Backend pool: servers, classes, statuses, and the registry that owns them
pub mod backend;

/// Cost model, completion-time tracking, and the LECT scheduler
pub mod scheduling;

/// The session router: one client request end to end
pub mod session;

/// Connection dispatch strategies driving session execution
pub mod dispatch;

// Re-export commonly used types for easier access
pub use crate::core::config::BalancerConfig;
pub use crate::core::error::{BalancerError, BalancerResult};
pub use crate::dispatch::{DispatchMode, DispatchStrategy};
pub use crate::scheduling::{CostModel, RequestDescriptor, Scheduler};
pub use crate::session::{serve_client, SessionOutcome, SessionSettings};
