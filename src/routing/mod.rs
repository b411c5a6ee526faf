//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate prefix)
//!     → Return: matched Route or None
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Keep declaration order
//!     → Compile prefix matchers
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always matches same route
//! - First match wins

pub mod matcher;
pub mod router;

pub use router::{Route, RouteTable};
