//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Build the server (fails fast on any configuration error)
//! - Bind the listener, hook up signals, serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Pipelines are built before binding, so traffic only arrives when ready

use tokio::net::TcpListener;

use crate::config::MockConfig;
use crate::error::ServerError;
use crate::http::MockServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::response::HandlerRegistry;

pub async fn start(config: MockConfig, handlers: HandlerRegistry) -> Result<(), ServerError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = MockServer::new(config, handlers)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown).await
}
