//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (metrics exporter, signal listener)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Config is expected to be validated already
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::forward::ForwardError;
use crate::http::GatewayServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid address {0:?}")]
    Address(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Upstream(#[from] ForwardError),

    #[error("failed to bind: {0}")]
    Bind(std::io::Error),

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Start every subsystem and serve until a shutdown signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let server = GatewayServer::new(config)?;

    let listener = TcpListener::bind(&server.config().listener.bind_address)
        .await
        .map_err(StartupError::Bind)?;
    let local_addr = listener.local_addr().map_err(StartupError::Bind)?;

    tracing::info!(
        address = %local_addr,
        upstream = %server.upstream_base(),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let _signals = shutdown.trigger_on_signal();

    server
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)
}
