//! API gateway binary.
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                  API GATEWAY                  │
//!   startup           │                                               │
//!   ──────────────────┼─▶ fanout ──▶ N × POST /analyze ──▶ join      │
//!                     │                                     │         │
//!                     │                                     ▼         │
//!   Client Request    │  ┌────────┐   ┌──────────┐   ┌──────────┐    │
//!   ──────────────────┼─▶│  http  │──▶│ routing  │──▶│ forward  │────┼──▶ analyze / ask
//!                     │  │ server │   │  table   │   │  (JSON)  │    │    services
//!   Client Response   │  └────────┘   └──────────┘   └──────────┘    │
//!   ◀─────────────────┼── status + body relayed verbatim ◀───────────┼───
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use api_gateway::config::{load_config, GatewayConfig};
use api_gateway::lifecycle::{signals::shutdown_signal, startup, Shutdown};
use api_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Forwards analysis and question requests to downstream services", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        fanout_targets = config.fanout.targets.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    startup::run(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
