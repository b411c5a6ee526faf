//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, concurrency > 0)
//! - Detect duplicate and shadowed route prefixes
//! - Check downstream addresses are plain-HTTP URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{FanOutConfig, GatewayConfig, RouteConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no routes configured")]
    NoRoutes,

    #[error("route '{0}' is declared more than once")]
    DuplicateRouteName(String),

    #[error("route '{route}': path prefix '{prefix}' must start with '/'")]
    InvalidPrefix { route: String, prefix: String },

    #[error("route '{route}': prefix '{prefix}' is unreachable behind route '{shadowed_by}'")]
    ShadowedPrefix {
        route: String,
        prefix: String,
        shadowed_by: String,
    },

    #[error("route '{route}': body field must not be empty")]
    EmptyBodyField { route: String },

    #[error("{context}: '{value}' is not a valid http URL")]
    InvalidUrl { context: String, value: String },

    #[error("listener: '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("fanout: job timeout ({job_secs}s) exceeds the aggregate deadline ({deadline_secs}s)")]
    JobTimeoutExceedsDeadline { job_secs: u64, deadline_secs: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    validate_routes(&config.routes, &mut errors);

    if config.fanout.enabled {
        validate_fanout(&config.fanout, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(routes: &[RouteConfig], errors: &mut Vec<ValidationError>) {
    if routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
        return;
    }

    let mut names = HashSet::new();
    for (i, route) in routes.iter().enumerate() {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }

        // First match wins, so an earlier prefix that covers this one hides it.
        if let Some(earlier) = routes[..i]
            .iter()
            .find(|e| route.path_prefix.starts_with(&e.path_prefix))
        {
            errors.push(ValidationError::ShadowedPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
                shadowed_by: earlier.name.clone(),
            });
        }

        if route.body_field.is_empty() {
            errors.push(ValidationError::EmptyBodyField {
                route: route.name.clone(),
            });
        }

        if !is_http_url(&route.downstream_base_url) {
            errors.push(ValidationError::InvalidUrl {
                context: format!("route '{}'", route.name),
                value: route.downstream_base_url.clone(),
            });
        }
    }
}

fn validate_fanout(fanout: &FanOutConfig, errors: &mut Vec<ValidationError>) {
    if !is_http_url(&fanout.endpoint) {
        errors.push(ValidationError::InvalidUrl {
            context: "fanout".to_string(),
            value: fanout.endpoint.clone(),
        });
    }
    if fanout.max_concurrency == 0 {
        errors.push(ValidationError::Zero("fanout.max_concurrency"));
    }
    if fanout.job_timeout_secs == 0 {
        errors.push(ValidationError::Zero("fanout.job_timeout_secs"));
    }
    if fanout.deadline_secs == 0 {
        errors.push(ValidationError::Zero("fanout.deadline_secs"));
    }
    if fanout.job_timeout_secs > fanout.deadline_secs {
        errors.push(ValidationError::JobTimeoutExceedsDeadline {
            job_secs: fanout.job_timeout_secs,
            deadline_secs: fanout.deadline_secs,
        });
    }
}

// The downstream client speaks plain HTTP only.
fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| u.scheme() == "http" && u.has_host())
        .unwrap_or(false)
}
