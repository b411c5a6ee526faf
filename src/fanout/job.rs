//! Fan-out jobs and their outcomes.

use std::time::Duration;

/// One startup POST to the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutJob {
    pub target_url: String,
}

impl FanOutJob {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
        }
    }

    /// One job per target, in list order.
    pub fn from_targets<S: AsRef<str>>(targets: &[S]) -> Vec<FanOutJob> {
        targets.iter().map(|t| FanOutJob::new(t.as_ref())).collect()
    }
}

/// What happened to a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Downstream answered 200.
    Succeeded,
    /// Downstream answered with any other status.
    Rejected { status: u16, body: String },
    /// The request could not be sent or completed.
    DispatchFailed(String),
    /// The per-job deadline passed.
    TimedOut,
    /// Still running when the aggregate deadline passed.
    Abandoned,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "succeeded",
            JobOutcome::Rejected { .. } => "rejected",
            JobOutcome::DispatchFailed(_) => "dispatch_failed",
            JobOutcome::TimedOut => "timed_out",
            JobOutcome::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub target_url: String,
    pub outcome: JobOutcome,
}

/// Per-target results, in the order the jobs were supplied.
#[derive(Debug, Clone)]
pub struct FanOutReport {
    pub results: Vec<JobResult>,
    pub elapsed: Duration,
}

impl FanOutReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn count(&self, label: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }
}
