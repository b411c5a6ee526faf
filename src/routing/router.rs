//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (the table holds a handful of routes)
//! - First match in declaration order wins
//! - Explicit `None` rather than silent default

use crate::config::RouteConfig;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// A compiled route: where a path prefix forwards to and how the body is wrapped.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    matcher: PathPrefixMatcher,
    downstream_base_url: String,
    body_field: String,
    param_label: String,
}

impl Route {
    pub fn from_config(config: &RouteConfig) -> Self {
        Self {
            name: config.name.clone(),
            matcher: PathPrefixMatcher::new(config.path_prefix.clone()),
            // The inbound path always starts with '/', so keep the base bare.
            downstream_base_url: config.downstream_base_url.trim_end_matches('/').to_string(),
            body_field: config.body_field.clone(),
            param_label: config
                .param_label
                .clone()
                .unwrap_or_else(|| config.body_field.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn downstream_base_url(&self) -> &str {
        &self.downstream_base_url
    }

    pub fn body_field(&self) -> &str {
        &self.body_field
    }

    /// Parameter name used in client-facing error messages.
    pub fn param_label(&self) -> &str {
        &self.param_label
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Downstream URL for an inbound path.
    pub fn target_for(&self, path: &str) -> String {
        format!("{}{}", self.downstream_base_url, path)
    }
}

/// Immutable, ordered route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let routes: Vec<Route> = routes.iter().map(Route::from_config).collect();

        for route in &routes {
            tracing::debug!(
                route = %route.name(),
                prefix = %route.path_prefix(),
                downstream = %route.downstream_base_url(),
                "Route compiled"
            );
        }

        Self { routes }
    }

    /// Find the first route whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(path))
    }
}
