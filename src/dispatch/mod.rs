//! # Connection Dispatch Strategies
//!
//! Two interchangeable drivers for the session core: a cooperative
//! single-task multiplexer ([`multiplexed::Multiplexed`]) and a
//! task-per-connection driver ([`worker::WorkerPerConnection`]). Both are
//! thin adapters over [`crate::session::serve_client`], so scheduling
//! decisions are identical regardless of which one is running — the choice
//! is an execution trade-off, not a behavioral one.

pub mod multiplexed;
pub mod worker;

pub use multiplexed::Multiplexed;
pub use worker::WorkerPerConnection;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::error::BalancerResult;
use crate::scheduling::Scheduler;
use crate::session::SessionSettings;

/// Which dispatch strategy to run, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    #[default]
    Worker,
    Multiplexed,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "worker" => Ok(DispatchMode::Worker),
            "multiplexed" => Ok(DispatchMode::Multiplexed),
            other => Err(format!("unknown dispatch mode: {}", other)),
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Worker => write!(f, "worker"),
            DispatchMode::Multiplexed => write!(f, "multiplexed"),
        }
    }
}

/// Core trait for connection dispatch strategies
///
/// A strategy owns the accept loop and decides how session futures execute;
/// everything else (scheduling, relaying, retirement) lives in the shared
/// session core.
#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    /// Drive sessions from the listener until the process shuts down
    async fn run(
        &self,
        listener: TcpListener,
        scheduler: Arc<Scheduler>,
        settings: SessionSettings,
    ) -> BalancerResult<()>;

    /// Strategy name for logging
    fn strategy_name(&self) -> &'static str;
}

/// Build the configured dispatch strategy
pub fn strategy_for(mode: DispatchMode) -> Box<dyn DispatchStrategy> {
    match mode {
        DispatchMode::Worker => Box::new(WorkerPerConnection),
        DispatchMode::Multiplexed => Box::new(Multiplexed),
    }
}
