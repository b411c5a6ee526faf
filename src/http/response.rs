//! Response handling.
//!
//! # Responsibilities
//! - Relay the downstream status and body to the client unchanged
//! - Map gateway errors to HTTP status codes
//!
//! # Design Decisions
//! - Downstream error statuses are relayed, never rewritten
//! - Client-facing error bodies are fixed strings; details only go to logs

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::forward::DownstreamResponse;

/// Failures handled at the gateway boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No route prefix matched the path.
    #[error("no route matches '{0}'")]
    RouteNotFound(String),

    /// The client sent no body. Holds the parameter label.
    #[error("'{0}' parameter is required in the POST body")]
    EmptyBody(String),

    /// The body is larger than the configured bound. Holds the bound.
    #[error("request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    /// The payload could not be serialized.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The downstream exchange did not complete.
    #[error("downstream unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::EmptyBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Body sent to the client.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::RouteNotFound(_) => "404 page not found".to_string(),
            GatewayError::EmptyBody(_) | GatewayError::PayloadTooLarge(_) => self.to_string(),
            GatewayError::Encode(_) => "Failed to encode JSON".to_string(),
            GatewayError::Unavailable(_) => "Service unavailable".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.client_message()).into_response()
    }
}

impl IntoResponse for DownstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}
