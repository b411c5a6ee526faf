//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! (route, raw parameter, inbound path)
//!     → payload.rs (wrap as { body_field: parameter })
//!     → client.rs (POST base + path, bounded by deadline)
//!     → DownstreamResponse (status, content type, body) passed back verbatim
//! ```
//!
//! # Design Decisions
//! - Downstream 4xx/5xx are not errors; they are relayed untouched
//! - Any failure to complete the exchange is `Unavailable`
//! - No retries: every inbound request makes at most one downstream call

pub mod client;
pub mod payload;

use std::time::Duration;

use axum::http::HeaderValue;

use crate::http::response::GatewayError;
use crate::routing::Route;

pub use client::{build_client, post_json, DownstreamClient, DownstreamFailure, DownstreamResponse};
pub use payload::wrap_param;

/// Relays a wrapped parameter to a route's downstream service.
#[derive(Clone)]
pub struct Forwarder {
    client: DownstreamClient,
    request_timeout: Duration,
}

impl Forwarder {
    pub fn new(client: DownstreamClient, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    /// Wrap `param` under the route's body field and POST it to
    /// `route base + original_path`.
    pub async fn forward(
        &self,
        route: &Route,
        param: &str,
        original_path: &str,
        request_id: Option<&HeaderValue>,
    ) -> Result<DownstreamResponse, GatewayError> {
        let payload = wrap_param(route.body_field(), param)?;
        let target = route.target_for(original_path);

        tracing::debug!(
            route = %route.name(),
            downstream = %target,
            payload_bytes = payload.len(),
            "Forwarding request"
        );

        let response = post_json(&self.client, &target, payload, request_id, self.request_timeout)
            .await
            .map_err(|e| {
                tracing::error!(route = %route.name(), downstream = %target, error = %e, "Downstream unavailable");
                GatewayError::Unavailable(e.to_string())
            })?;

        tracing::debug!(
            route = %route.name(),
            status = %response.status,
            body_bytes = response.body.len(),
            "Downstream responded"
        );

        Ok(response)
    }
}
