//! Startup fan-out subsystem.
//!
//! # Data Flow
//! ```text
//! configured target list
//!     → job.rs (one FanOutJob per target)
//!     → launcher.rs (N tasks, ≤ max_concurrency in flight)
//!     → POST { "url": target } to the analysis endpoint
//!     → join barrier (bounded by aggregate deadline)
//!     → FanOutReport → server may start listening
//! ```

pub mod job;
pub mod launcher;

pub use job::{FanOutJob, FanOutReport, JobOutcome, JobResult};
pub use launcher::{FanOutError, FanOutLauncher, LauncherState};
