//! Starter web service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ CatchPanicLayer ──▶ ObservabilityLayer ──▶ TimeoutLayer ──▶ Router
//!                                           │                                   │
//!                                           │ Request / Response /              ├─ …/health
//!                                           │ Unhandled Exception events        ├─ …/info
//!                                           ▼                                   └─ …/sample ──▶ joke API
//!                                       EventSink
//!                              (tracing access target)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use starter_service::config::{self, ServiceConfig};
use starter_service::http::HttpServer;
use starter_service::lifecycle::{signals, Shutdown};
use starter_service::observability::{self, TracingSink};

#[derive(Parser)]
#[command(name = "starter-service")]
#[command(about = "Starter web service with structured request logging", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    observability::logging::init(&config.observability)?;
    observability::panic::install_hook();

    tracing::info!("starter-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        app = %config.app.name,
        env = %config.app.env,
        service_position = ?config.observability.service_position,
        log_format = ?config.observability.log_format,
        "Configuration loaded"
    );

    let event_sink = Arc::new(TracingSink);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, event_sink)?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_signals(shutdown.clone()));
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
