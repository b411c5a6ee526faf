//! Downstream HTTP client.
//!
//! # Responsibilities
//! - Build the pooled client shared by the forwarder and the fan-out
//! - POST a JSON payload and buffer the full response
//! - Bound every exchange with a deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the deadline covers connect, send and body read
//! - Timeout errors are distinct from connection errors
//! - Plain HTTP only (no TLS connector)

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time;

use crate::config::TimeoutConfig;
use crate::http::request::X_REQUEST_ID;

/// Client used for every outbound call.
pub type DownstreamClient = Client<HttpConnector, Body>;

/// Build the downstream client with the configured connect timeout.
pub fn build_client(timeouts: &TimeoutConfig) -> DownstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    Client::builder(TokioExecutor::new()).build(connector)
}

/// A completed downstream exchange, body fully read.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Reasons a downstream exchange did not complete.
#[derive(Debug, Error)]
pub enum DownstreamFailure {
    #[error("invalid downstream target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("downstream request failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("downstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to read downstream body: {0}")]
    Body(#[from] axum::Error),
}

/// POST `payload` as JSON to `target` and wait for the whole response.
pub async fn post_json(
    client: &DownstreamClient,
    target: &str,
    payload: Vec<u8>,
    request_id: Option<&HeaderValue>,
    deadline: Duration,
) -> Result<DownstreamResponse, DownstreamFailure> {
    let invalid = |reason: String| DownstreamFailure::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    let uri: Uri = target.parse().map_err(|e| invalid(format!("{e}")))?;

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = request_id {
        builder = builder.header(X_REQUEST_ID, id.clone());
    }
    let request = builder
        .body(Body::from(payload))
        .map_err(|e| invalid(e.to_string()))?;

    let exchange = async {
        let response = client.request(request).await?;
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), usize::MAX).await?;

        Ok::<_, DownstreamFailure>(DownstreamResponse {
            status: parts.status,
            content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
            body,
        })
    };

    match time::timeout(deadline, exchange).await {
        Ok(result) => result,
        Err(_) => Err(DownstreamFailure::Timeout(deadline)),
    }
}
