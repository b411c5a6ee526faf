//! Startup fan-out launcher.
//!
//! # Responsibilities
//! - Spawn one task per job, bounded by a concurrency ceiling
//! - POST `{ body_field: target }` to the analysis endpoint
//! - Join every task before reporting, within an aggregate deadline
//!
//! # Design Decisions
//! - One run per launcher: `NotStarted → Running → Completed`
//! - Job failures are logged and recorded, never propagated
//! - Tasks still running at the deadline are aborted and marked `Abandoned`
//! - A task that panics is recorded as `DispatchFailed`, not `Abandoned`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio::time;

use crate::config::FanOutConfig;
use crate::fanout::job::{FanOutJob, FanOutReport, JobOutcome, JobResult};
use crate::forward::{post_json, wrap_param, DownstreamClient, DownstreamFailure};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherState {
    NotStarted,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FanOutError {
    #[error("fan-out already launched (state: {0:?})")]
    AlreadyLaunched(LauncherState),
}

/// Everything a spawned task needs to run one job.
#[derive(Clone)]
struct JobUnit {
    client: DownstreamClient,
    endpoint: Arc<str>,
    body_field: Arc<str>,
    timeout: Duration,
}

impl JobUnit {
    async fn run(&self, target: &str) -> JobOutcome {
        let payload = match wrap_param(&self.body_field, target) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(url = %target, error = %e, "Failed to encode fan-out payload");
                return JobOutcome::DispatchFailed(e.to_string());
            }
        };

        let outcome = match post_json(&self.client, &self.endpoint, payload, None, self.timeout).await {
            Ok(response) if response.status == StatusCode::OK => {
                tracing::info!(url = %target, "Successfully processed");
                JobOutcome::Succeeded
            }
            Ok(response) => {
                let body = String::from_utf8_lossy(&response.body).into_owned();
                tracing::warn!(
                    url = %target,
                    status = response.status.as_u16(),
                    body = %body,
                    "Failed to process"
                );
                JobOutcome::Rejected {
                    status: response.status.as_u16(),
                    body,
                }
            }
            Err(DownstreamFailure::Timeout(after)) => {
                tracing::warn!(url = %target, timeout = ?after, "Fan-out job timed out");
                JobOutcome::TimedOut
            }
            Err(e) => {
                tracing::error!(url = %target, error = %e, "Failed to dispatch fan-out job");
                JobOutcome::DispatchFailed(e.to_string())
            }
        };

        metrics::record_fanout_job(outcome.label());
        outcome
    }
}

/// Runs the startup batch to completion before the server listens.
pub struct FanOutLauncher {
    unit: JobUnit,
    max_concurrency: usize,
    deadline: Duration,
    state: LauncherState,
}

impl FanOutLauncher {
    pub fn new(config: &FanOutConfig, client: DownstreamClient) -> Self {
        Self {
            unit: JobUnit {
                client,
                endpoint: Arc::from(config.endpoint.as_str()),
                body_field: Arc::from(config.body_field.as_str()),
                timeout: Duration::from_secs(config.job_timeout_secs),
            },
            max_concurrency: config.max_concurrency.max(1),
            deadline: Duration::from_secs(config.deadline_secs),
            state: LauncherState::NotStarted,
        }
    }

    /// Override the per-job and aggregate deadlines.
    pub fn with_deadlines(mut self, job_timeout: Duration, deadline: Duration) -> Self {
        self.unit.timeout = job_timeout;
        self.deadline = deadline;
        self
    }

    pub fn state(&self) -> LauncherState {
        self.state
    }

    /// Run every job and wait for all of them (or the deadline).
    pub async fn launch<I>(&mut self, jobs: I) -> Result<FanOutReport, FanOutError>
    where
        I: IntoIterator<Item = FanOutJob>,
    {
        if self.state != LauncherState::NotStarted {
            return Err(FanOutError::AlreadyLaunched(self.state));
        }
        self.state = LauncherState::Running;

        let jobs: Vec<FanOutJob> = jobs.into_iter().collect();
        let started = Instant::now();

        tracing::info!(
            jobs = jobs.len(),
            max_concurrency = self.max_concurrency,
            endpoint = %self.unit.endpoint,
            "Fan-out starting"
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut index_of = HashMap::with_capacity(jobs.len());

        for (index, job) in jobs.iter().enumerate() {
            let unit = self.unit.clone();
            let permits = permits.clone();
            let target = job.target_url.clone();

            let handle = tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => unit.run(&target).await,
                    Err(_) => JobOutcome::DispatchFailed("concurrency limiter closed".to_string()),
                };
                (index, outcome)
            });
            index_of.insert(handle.id(), index);
        }

        let outcomes = join_within(tasks, &index_of, jobs.len(), self.deadline).await;

        let results: Vec<JobResult> = jobs
            .into_iter()
            .zip(outcomes)
            .map(|(job, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    tracing::warn!(url = %job.target_url, "Fan-out job abandoned");
                    metrics::record_fanout_job(JobOutcome::Abandoned.label());
                    JobOutcome::Abandoned
                });
                JobResult {
                    target_url: job.target_url,
                    outcome,
                }
            })
            .collect();

        self.state = LauncherState::Completed;

        let report = FanOutReport {
            results,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Fan-out completed"
        );

        Ok(report)
    }
}

/// Collect task outcomes into per-job slots until every task has finished
/// or `deadline` has elapsed. Slots left `None` belong to abandoned tasks.
async fn join_within(
    mut tasks: JoinSet<(usize, JobOutcome)>,
    index_of: &HashMap<task::Id, usize>,
    slots: usize,
    deadline: Duration,
) -> Vec<Option<JobOutcome>> {
    let mut outcomes: Vec<Option<JobOutcome>> = (0..slots).map(|_| None).collect();
    let expires = time::Instant::now() + deadline;

    loop {
        match time::timeout_at(expires, tasks.join_next()).await {
            Ok(Some(Ok((index, outcome)))) => outcomes[index] = Some(outcome),
            Ok(Some(Err(e))) => {
                tracing::error!(error = %e, "Fan-out task did not finish");
                if let Some(&index) = index_of.get(&e.id()) {
                    let outcome = JobOutcome::DispatchFailed(e.to_string());
                    metrics::record_fanout_job(outcome.label());
                    outcomes[index] = Some(outcome);
                }
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    remaining = tasks.len(),
                    deadline = ?deadline,
                    "Fan-out deadline reached, abandoning remaining jobs"
                );
                tasks.abort_all();
                break;
            }
        }
    }

    outcomes
}
