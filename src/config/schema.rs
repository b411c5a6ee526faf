//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body bound).
    pub listener: ListenerConfig,

    /// Route definitions, checked in declaration order.
    pub routes: Vec<RouteConfig>,

    /// Downstream call deadlines.
    pub timeouts: TimeoutConfig,

    /// Startup fan-out settings.
    pub fanout: FanOutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: default_routes(),
            timeouts: TimeoutConfig::default(),
            fanout: FanOutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest inbound body the gateway will read.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Route configuration mapping a path prefix to a downstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Downstream base address (e.g., "http://localhost:5001").
    pub downstream_base_url: String,

    /// JSON field the request body is wrapped under.
    pub body_field: String,

    /// Parameter name reported to clients when the body is missing.
    /// Falls back to `body_field`.
    #[serde(default)]
    pub param_label: Option<String>,
}

impl RouteConfig {
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        downstream_base_url: impl Into<String>,
        body_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
            downstream_base_url: downstream_base_url.into(),
            body_field: body_field.into(),
            param_label: None,
        }
    }

    pub fn with_param_label(mut self, label: impl Into<String>) -> Self {
        self.param_label = Some(label.into());
        self
    }
}

/// The analysis and question-answering routes of the reference deployment.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("analyze", "/analyze/", "http://localhost:5001", "url"),
        RouteConfig::new("ask", "/ask/", "http://localhost:5002", "question")
            .with_param_label("user-input"),
    ]
}

/// Timeout configuration for downstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Startup fan-out configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Run the fan-out before serving.
    pub enabled: bool,

    /// Analysis endpoint every job posts to.
    pub endpoint: String,

    /// JSON field each target URL is wrapped under.
    pub body_field: String,

    /// Target URLs, one job each.
    pub targets: Vec<String>,

    /// Maximum jobs in flight at once.
    pub max_concurrency: usize,

    /// Per-job deadline in seconds.
    pub job_timeout_secs: u64,

    /// Deadline for the whole fan-out in seconds. Jobs still running
    /// after it are abandoned.
    pub deadline_secs: u64,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:5001/analyze".to_string(),
            body_field: "url".to_string(),
            targets: reference_targets(),
            max_concurrency: 20,
            job_timeout_secs: 30,
            deadline_secs: 120,
        }
    }
}

/// The article batch analysed at startup by the reference deployment.
pub fn reference_targets() -> Vec<String> {
    [
        "https://en.wikipedia.org/wiki/Rust_(programming_language)",
        "https://en.wikipedia.org/wiki/Memory_safety",
        "https://en.wikipedia.org/wiki/Concurrency_(computer_science)",
        "https://en.wikipedia.org/wiki/Asynchronous_I/O",
        "https://en.wikipedia.org/wiki/Reverse_proxy",
        "https://en.wikipedia.org/wiki/API_management",
        "https://en.wikipedia.org/wiki/Microservices",
        "https://en.wikipedia.org/wiki/Hypertext_Transfer_Protocol",
        "https://en.wikipedia.org/wiki/JSON",
        "https://en.wikipedia.org/wiki/Natural_language_processing",
        "https://en.wikipedia.org/wiki/Question_answering",
        "https://en.wikipedia.org/wiki/Automatic_summarization",
        "https://en.wikipedia.org/wiki/Information_retrieval",
        "https://en.wikipedia.org/wiki/Large_language_model",
        "https://en.wikipedia.org/wiki/Word_embedding",
        "https://en.wikipedia.org/wiki/Vector_database",
        "https://en.wikipedia.org/wiki/Web_scraping",
        "https://en.wikipedia.org/wiki/Load_balancing_(computing)",
        "https://en.wikipedia.org/wiki/Circuit_breaker_design_pattern",
        "https://en.wikipedia.org/wiki/Fan-out_(software)",
    ]
    .iter()
    .map(|url| url.to_string())
    .collect()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
