//! # TCP Balancer - Main Entry Point
//!
//! Startup sequence: initialize logging, load and validate configuration,
//! connect to every configured backend (any unreachable backend is fatal),
//! bind the listening socket, then hand control to the configured dispatch
//! strategy until a shutdown signal arrives.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tracing::{error, info};

use tcp_balancer::backend::{Backend, BackendRegistry};
use tcp_balancer::core::error::BalancerError;
use tcp_balancer::dispatch::strategy_for;
use tcp_balancer::{BalancerConfig, BalancerResult, CostModel, Scheduler, SessionSettings};

#[tokio::main]
async fn main() {
    init_observability();

    info!("Starting TCP balancer");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        error!("Failed to start balancer: {}", e);
        std::process::exit(1);
    }

    info!("TCP balancer shutdown complete");
}

/// Initialize logging with env-filter support (`RUST_LOG` overrides)
fn init_observability() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tcp_balancer=info".into()),
        )
        .init();
}

async fn run() -> BalancerResult<()> {
    let config_path = std::env::var("BALANCER_CONFIG_PATH")
        .unwrap_or_else(|_| "config/balancer.yaml".to_string());

    let config = BalancerConfig::load_from_file(&config_path).await.map_err(|e| {
        error!("Failed to load configuration from {}: {}", config_path, e);
        e
    })?;
    info!(path = %config_path, "Configuration loaded and validated");

    let registry = connect_backends(&config).await?;
    let scheduler = Arc::new(Scheduler::new(registry, CostModel::from_config(&config.cost)));

    let listener = TcpListener::bind(config.listener.addr()).await?;
    info!(addr = %config.listener.addr(), "Balancer listening for clients");

    let strategy = strategy_for(config.dispatch);
    info!(strategy = strategy.strategy_name(), "Dispatch strategy selected");

    let settings = SessionSettings::from(&config);
    tokio::select! {
        result = strategy.run(listener, scheduler, settings) => result,
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping balancer");
            Ok(())
        }
    }
}

/// Establish one persistent connection per configured backend
///
/// Runs before the listener accepts anything; a backend that cannot be
/// reached at startup is a fatal error rather than a degraded pool.
async fn connect_backends(config: &BalancerConfig) -> BalancerResult<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    for backend in &config.backends {
        let addr = backend.addr();
        info!(backend = %backend.name, %addr, "Connecting to backend");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| BalancerError::backend_connect(&backend.name, e))?;
        info!(backend = %backend.name, class = %backend.class, "Connected to backend");
        registry.register(Backend::connected(
            backend.name.clone(),
            addr,
            backend.class,
            stream,
        ));
    }

    info!(count = registry.active_count(), "Backend pool ready");
    Ok(registry)
}
