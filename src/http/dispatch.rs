//! Request dispatch.
//!
//! Selects a route by path prefix, extracts the body parameter and hands
//! both to the [`Forwarder`]. Every failure is turned into a response here.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

use crate::forward::{DownstreamResponse, Forwarder};
use crate::http::request::{read_param, BodyRejection};
use crate::http::response::GatewayError;
use crate::observability::metrics;
use crate::routing::{Route, RouteTable};

#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    forwarder: Forwarder,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>, forwarder: Forwarder, max_body_bytes: usize) -> Self {
        Self {
            routes,
            forwarder,
            max_body_bytes,
        }
    }

    /// Handle one inbound request. Unmatched paths never read the body
    /// and never reach a downstream service.
    pub async fn dispatch(&self, path: &str, body: Body, request_id: Option<&HeaderValue>) -> Response {
        let start_time = Instant::now();

        let Some(route) = self.routes.match_path(path) else {
            tracing::warn!(path = %path, "No route matched");
            metrics::record_request("none", 404, start_time);
            return GatewayError::RouteNotFound(path.to_string()).into_response();
        };

        let response = match self.forward(route, path, body, request_id).await {
            Ok(downstream) => downstream.into_response(),
            Err(e) => e.into_response(),
        };

        metrics::record_request(route.name(), response.status().as_u16(), start_time);
        response
    }

    async fn forward(
        &self,
        route: &Route,
        path: &str,
        body: Body,
        request_id: Option<&HeaderValue>,
    ) -> Result<DownstreamResponse, GatewayError> {
        let param = read_param(body, self.max_body_bytes).await.map_err(|rejection| {
            tracing::warn!(route = %route.name(), path = %path, reason = %rejection, "Rejected request body");
            match rejection {
                BodyRejection::Empty(_) => GatewayError::EmptyBody(route.param_label().to_string()),
                BodyRejection::TooLarge { limit } => GatewayError::PayloadTooLarge(limit),
            }
        })?;

        self.forwarder.forward(route, &param, path, request_id).await
    }
}
