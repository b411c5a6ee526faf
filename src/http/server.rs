//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Stop accepting on shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::forward::{DownstreamClient, Forwarder};
use crate::http::dispatch::Dispatcher;
use crate::http::request::{MakeGatewayRequestId, X_REQUEST_ID};
use crate::routing::RouteTable;

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig, client: DownstreamClient) -> Self {
        let routes = Arc::new(RouteTable::from_config(&config.routes));
        let forwarder = Forwarder::new(client, Duration::from_secs(config.timeouts.request_secs));
        let dispatcher = Dispatcher::new(routes, forwarder, config.listener.max_body_bytes);

        let router = Self::build_router(dispatcher);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(dispatcher: Dispatcher) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(dispatcher)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeGatewayRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single entry point: every method and path goes through the dispatcher.
async fn gateway_handler(State(dispatcher): State<Dispatcher>, request: Request) -> Response {
    let request_id = request.headers().get(X_REQUEST_ID).cloned();
    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = ?request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Dispatching request"
    );

    dispatcher
        .dispatch(parts.uri.path(), body, request_id.as_ref())
        .await
}
