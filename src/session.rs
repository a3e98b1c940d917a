//! # Session Router
//!
//! One client connection, one request, one response. [`serve_client`] is the
//! shared core both dispatch strategies drive: it reads a single bounded
//! payload, asks the scheduler for a backend, forwards the raw bytes, and
//! relays the backend's single response verbatim before closing.
//!
//! Failures are values here, not errors: every way a session can end is a
//! [`SessionOutcome`], and none of them propagates beyond the session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::config::BalancerConfig;
use crate::scheduling::{RequestDescriptor, Scheduler};

/// Per-session knobs, copied out of the config at startup
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Maximum request/response payload size in bytes
    pub buffer_size: usize,
    /// Bounded wait for the backend exchange; `None` waits indefinitely
    pub response_timeout: Option<Duration>,
}

impl From<&BalancerConfig> for SessionSettings {
    fn from(config: &BalancerConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            response_timeout: config.backend_response_timeout,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Response relayed to the client
    Completed { backend: String, response_bytes: usize },
    /// Client hung up before or during the exchange
    ClientDisconnected,
    /// No active backend; request dropped without a response
    Dropped,
    /// Backend exchange failed; the backend was retired and the client got
    /// no response
    BackendFailed { backend: String },
}

/// Route one accepted client connection through the pool
///
/// The connection is closed when the returned future completes, whatever the
/// outcome. The scheduler decision and the backend exchange are the only
/// points of contact with shared state.
pub async fn serve_client(
    mut client: TcpStream,
    peer: SocketAddr,
    scheduler: Arc<Scheduler>,
    settings: SessionSettings,
) -> SessionOutcome {
    let mut request = vec![0u8; settings.buffer_size];
    let len = match client.read(&mut request).await {
        Ok(0) | Err(_) => {
            debug!(%peer, "Client disconnected without a request");
            return SessionOutcome::ClientDisconnected;
        }
        Ok(len) => len,
    };
    let request = &request[..len];

    let descriptor = RequestDescriptor::parse(request);
    let Some(selection) = scheduler.select(&descriptor, Instant::now()) else {
        warn!(%peer, "No active backend available, dropping request");
        counter!("session_dropped_requests").increment(1);
        return SessionOutcome::Dropped;
    };

    let Some(handle) = selection.handle.clone() else {
        scheduler.retire(&selection.name);
        return SessionOutcome::BackendFailed { backend: selection.name };
    };

    // The stream lock is taken before the timeout starts: time spent queued
    // behind another session's exchange on the same backend is load, not a
    // failure, and must not count against this session's budget. The bounded
    // wait covers only this session's own write and read.
    let mut stream = handle.lock().await;
    let response = match settings.response_timeout {
        Some(limit) => {
            match timeout(limit, exchange(&mut stream, request, settings.buffer_size)).await {
                Ok(result) => result,
                Err(_) => Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "backend response timed out",
                )),
            }
        }
        None => exchange(&mut stream, request, settings.buffer_size).await,
    };
    drop(stream);

    let response = match response {
        Ok(response) => response,
        Err(error) => {
            warn!(backend = %selection.name, %peer, %error, "Backend exchange failed, retiring backend");
            counter!("session_backend_failures").increment(1);
            scheduler.retire(&selection.name);
            return SessionOutcome::BackendFailed { backend: selection.name };
        }
    };

    if let Err(error) = client.write_all(&response).await {
        // The backend finished its exchange; only the client side is gone.
        debug!(%peer, %error, "Client went away before the response could be relayed");
        return SessionOutcome::ClientDisconnected;
    }

    counter!("session_completed").increment(1);
    debug!(
        backend = %selection.name,
        %peer,
        response_bytes = response.len(),
        "Relayed response and closed session"
    );
    SessionOutcome::Completed {
        backend: selection.name,
        response_bytes: response.len(),
    }
}

/// Forward the request and read exactly one response payload
///
/// The caller holds the backend's stream lock for the whole exchange, so
/// each backend carries at most one in-flight request at a time. A clean
/// close by the backend (zero-length read) counts as a failure: the session
/// still owes its client a response.
async fn exchange(
    stream: &mut TcpStream,
    request: &[u8],
    buffer_size: usize,
) -> std::io::Result<Vec<u8>> {
    stream.write_all(request).await?;

    let mut response = vec![0u8; buffer_size];
    let len = stream.read(&mut response).await?;
    if len == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "backend closed connection",
        ));
    }
    response.truncate(len);
    Ok(response)
}
