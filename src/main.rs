//! Correlation API service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ correlation layer ──▶ trace ──▶ timeout ──▶ catch-panic ──▶ router
//!                      │  resolve id                                              │
//!                      │  push CorrelationId into log context                     ▼
//!                      │  LogService::request                              versioned handlers
//!                      ▼                                                          │
//!     Client Response ◀── X-Correlation-Id ◀──────────────────────────────────────┘
//!
//!     every record ──▶ RecordLayer (span + context + event fields)
//!                  ──▶ PropertyFilter ──▶ stdout (json | text)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use correlation_api::config::{load_config, validate_config, ConfigError, ServiceConfig};
use correlation_api::lifecycle::{signals, Shutdown};
use correlation_api::observability::{logging, LogService, TracingLogService};
use correlation_api::HttpServer;

#[derive(Parser)]
#[command(name = "correlation-api")]
#[command(about = "Web API with request correlation and structured logging", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        log_level = %config.observability.log_level,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        shutdown.trigger();
    });

    let log: Arc<dyn LogService> = Arc::new(TracingLogService::new());
    let server = HttpServer::new(config, log);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
