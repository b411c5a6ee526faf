//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch, forward, fanout produce:
//!     → logging.rs (structured log events, request ID as a field)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
