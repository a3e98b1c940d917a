//! Multiplexed dispatch: every session interleaved on one control task.

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, trace, warn};

use crate::core::error::BalancerResult;
use crate::dispatch::DispatchStrategy;
use crate::scheduling::Scheduler;
use crate::session::{serve_client, SessionSettings};

/// Cooperative multiplexer: a single control loop polls the listener and
/// every in-flight session future together
///
/// No task is spawned per session; sessions advance only when this loop
/// polls them and suspend only at their own await points, so a stalled
/// backend parks exactly one session future while the rest keep moving. The
/// order readiness arrives in is whatever the runtime reports; nothing here
/// may assume it is deterministic across runs.
pub struct Multiplexed;

#[async_trait]
impl DispatchStrategy for Multiplexed {
    async fn run(
        &self,
        listener: TcpListener,
        scheduler: Arc<Scheduler>,
        settings: SessionSettings,
    ) -> BalancerResult<()> {
        let mut sessions = FuturesUnordered::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "Accepted client connection");
                        let scheduler = Arc::clone(&scheduler);
                        let settings = settings.clone();
                        sessions.push(async move {
                            let outcome = serve_client(stream, peer, scheduler, settings).await;
                            (peer, outcome)
                        });
                    }
                    Err(error) => warn!(%error, "Failed to accept client connection"),
                },
                Some((peer, outcome)) = sessions.next() => {
                    trace!(%peer, ?outcome, "Session finished");
                }
            }
        }
    }

    fn strategy_name(&self) -> &'static str {
        "multiplexed"
    }
}
