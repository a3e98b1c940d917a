//! # Scheduling Module
//!
//! Everything the balancer needs to decide where a request goes: the cost
//! model ([`cost`]), the per-backend completion-time estimates ([`tracker`]),
//! and the least-estimated-completion-time scheduler itself ([`scheduler`]).

pub mod cost;
pub mod scheduler;
pub mod tracker;

pub use cost::{CostModel, RequestDescriptor};
pub use scheduler::{Scheduler, Selection};
pub use tracker::FinishTimeTracker;
