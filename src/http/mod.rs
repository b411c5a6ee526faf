//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → dispatch.rs (route lookup, body → parameter, size bound)
//!     → forward (wrap + POST to downstream)
//!     → response.rs (relay downstream status/body or map error)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use request::{extract_param, read_param, BodyRejection, EmptyBody, MakeGatewayRequestId, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::GatewayServer;
