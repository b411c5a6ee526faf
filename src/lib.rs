//! Single-entry HTTP gateway.
//!
//! Wraps a raw request body as a one-field JSON payload, forwards it to the
//! downstream service selected by path prefix and relays the answer verbatim.
//! At startup a batch of analysis requests is fanned out and joined before the
//! listener is bound.

pub mod config;
pub mod fanout;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
