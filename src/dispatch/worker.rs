//! Worker-per-connection dispatch: one spawned task per accepted client.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, trace, warn};

use crate::core::error::BalancerResult;
use crate::dispatch::DispatchStrategy;
use crate::scheduling::Scheduler;
use crate::session::{serve_client, SessionSettings};

/// Runs each session on an independently scheduled task
///
/// Workers share nothing but the scheduler; correctness under true
/// parallelism rests entirely on the scheduler's critical section.
pub struct WorkerPerConnection;

#[async_trait]
impl DispatchStrategy for WorkerPerConnection {
    async fn run(
        &self,
        listener: TcpListener,
        scheduler: Arc<Scheduler>,
        settings: SessionSettings,
    ) -> BalancerResult<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    warn!(%error, "Failed to accept client connection");
                    continue;
                }
            };
            debug!(%peer, "Accepted client connection");

            let scheduler = Arc::clone(&scheduler);
            let settings = settings.clone();
            tokio::spawn(async move {
                let outcome = serve_client(stream, peer, scheduler, settings).await;
                trace!(%peer, ?outcome, "Session finished");
            });
        }
    }

    fn strategy_name(&self) -> &'static str {
        "worker_per_connection"
    }
}
