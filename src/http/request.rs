//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Read the raw body as the single forwarded parameter
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An unreadable body and an empty body are the same failure
//! - A body over the size bound is its own failure, never reported as empty
//! - The body is never trimmed, decoded or schema-checked

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, Request};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request carried no usable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request body is absent or empty")]
pub struct EmptyBody;

/// Why a request body could not become the forwarded parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BodyRejection {
    #[error(transparent)]
    Empty(#[from] EmptyBody),

    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Turn the outcome of a body read into the forwarded parameter.
///
/// Bytes are taken verbatim; invalid UTF-8 sequences become U+FFFD.
pub fn extract_param<E>(read: Result<Bytes, E>) -> Result<String, EmptyBody> {
    match read {
        Ok(bytes) if !bytes.is_empty() => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        _ => Err(EmptyBody),
    }
}

/// Read at most `limit` bytes of `body` and extract the parameter.
pub async fn read_param(body: Body, limit: usize) -> Result<String, BodyRejection> {
    let read = Limited::new(body, limit).collect().await;

    if let Err(e) = &read {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            return Err(BodyRejection::TooLarge { limit });
        }
    }

    Ok(extract_param(read.map(|collected| collected.to_bytes()))?)
}
