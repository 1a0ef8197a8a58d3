//! Configurable HTTP mock server.
//!
//! # Architecture Overview
//!
//! ```text
//!   request ──▶ http server ──▶ route table ──▶ pipeline ──▶ response producer
//!                (request id,     (first match,   observe      static JSON
//!                 tracing)         404 otherwise)  cors         static text
//!                                                  rate limit   no content
//!                                                  delay        proxy ──▶ upstream
//!                                                  parse body   custom handler
//!                                                  metadata
//!                                                  fail sim
//!
//!   shared: simulation dials ◀── admin API ◀── mock-cli
//!           rate tracker (ticker) ──▶ reporter / admin rates
//! ```

use std::path::PathBuf;

use clap::Parser;

use mock_server::config::load_config;
use mock_server::lifecycle::startup;
use mock_server::observability::logging::init_logging;
use mock_server::HandlerRegistry;

#[derive(Parser)]
#[command(name = "mock-server")]
#[command(about = "Configurable HTTP mock server", long_about = None)]
struct Args {
    /// Path to the config file (`.json` for JSON, TOML otherwise)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the listener host
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Override the listener port
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    config.listener.override_bind(args.host.as_deref(), args.port);

    init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        bind_address = %config.listener.bind_address,
        endpoints = config.endpoints.len(),
        "mock-server starting"
    );

    startup::start(config, HandlerRegistry::with_builtins()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
