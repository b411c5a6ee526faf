//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the shared downstream client
//! - Run the startup fan-out to completion
//! - Bind the listener and serve
//!
//! # Design Decisions
//! - Fail fast: invalid config or bind failure is fatal
//! - The listener is bound only after the fan-out report exists, so no
//!   connection is accepted while fan-out jobs are outstanding
//! - Fan-out job failures never abort startup

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{validate_config, ConfigError, FanOutConfig, GatewayConfig};
use crate::fanout::{FanOutError, FanOutJob, FanOutLauncher, FanOutReport};
use crate::forward::{build_client, DownstreamClient};
use crate::http::GatewayServer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    FanOut(#[from] FanOutError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Run the configured fan-out batch and wait for it.
pub async fn run_fanout(
    config: &FanOutConfig,
    client: DownstreamClient,
) -> Result<FanOutReport, FanOutError> {
    let mut launcher = FanOutLauncher::new(config, client);
    launcher.launch(FanOutJob::from_targets(&config.targets)).await
}

/// Start the gateway: fan-out first, then listen until `shutdown` fires.
pub async fn run(
    config: GatewayConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let client = build_client(&config.timeouts);

    if config.fanout.enabled {
        let report = run_fanout(&config.fanout, client.clone()).await?;
        if report.failed() > 0 {
            tracing::warn!(
                failed = report.failed(),
                total = report.total(),
                "Some startup fan-out jobs failed"
            );
        }
    } else {
        tracing::info!("Startup fan-out disabled");
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = GatewayServer::new(config, client);
    server.run(listener, shutdown).await.map_err(StartupError::Serve)
}
