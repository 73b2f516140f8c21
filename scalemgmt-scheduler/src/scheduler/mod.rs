//! Dependency-aware job scheduler
//!
//! Queues prepared requests, submits them to the remote system in
//! dependency order and polls the resulting remote jobs until every job is
//! terminal. Work advances in discrete ticks driven by the caller; nothing
//! runs in the background.

mod table;

pub use table::JobTable;

use chrono::Utc;
use scalemgmt_core::domain::job::{Job, JobStatus};
use scalemgmt_core::domain::outcome::SubmitOutcome;
use scalemgmt_core::domain::request::PreparedRequest;
use scalemgmt_core::dto::job::JobSnapshot;
use scalemgmt_core::dto::queue::{JobTickState, QueueResponse, QueueStatus, TickReport};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, SchedulerError};
use crate::remote::RemoteJobClient;

/// Settings for the blocking run loop
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Delay between live ticks
    pub tick_interval: Duration,
    /// Give up after this many ticks if the queue is still not terminal
    pub max_ticks: Option<u64>,
}

/// What a tick does with one job
enum Step {
    Skip,
    Hold,
    DependencyFailed { requires: Uuid, status: JobStatus },
    Submit,
    Poll(String),
    Settle,
}

/// Owns the locally tracked jobs and drives them to completion
pub struct Scheduler {
    client: Arc<dyn RemoteJobClient>,
    config: SchedulerConfig,
    jobs: JobTable,
    ticks: u64,
}

impl Scheduler {
    /// Creates a scheduler with default settings (no tick delay, no tick limit)
    pub fn new(client: Arc<dyn RemoteJobClient>) -> Self {
        Self::with_config(client, SchedulerConfig::default())
    }

    pub fn with_config(client: Arc<dyn RemoteJobClient>, config: SchedulerConfig) -> Self {
        Self {
            client,
            config,
            jobs: JobTable::new(),
            ticks: 0,
        }
    }

    // =============================================================================
    // Registration
    // =============================================================================

    /// Queue a request with no dependency
    pub fn queue(&mut self, request: PreparedRequest) -> Result<QueueResponse> {
        self.queue_job(request, None, true)
    }

    /// Queue a request, optionally after another job
    ///
    /// An equal request that is already queued is not queued again: the
    /// existing job's id is returned with `queued = false` and a reason.
    ///
    /// # Arguments
    /// * `request` - The prepared request to submit
    /// * `requires` - Job that must be terminal before this one is submitted
    /// * `run_on_dependency_failure` - Submit even if `requires` failed
    ///
    /// # Errors
    /// Returns `UnknownDependency` if `requires` is not a registered job.
    pub fn queue_job(
        &mut self,
        request: PreparedRequest,
        requires: Option<Uuid>,
        run_on_dependency_failure: bool,
    ) -> Result<QueueResponse> {
        if let Some(dependency) = requires {
            if !self.jobs.contains(dependency) {
                warn!("Refusing to queue {}: required job {} is not registered", request, dependency);
                return Err(SchedulerError::UnknownDependency(dependency));
            }
        }

        if let Some(existing) = self.jobs.find_request(&request) {
            info!("{} already queued as job {}", request, existing);
            return Ok(QueueResponse {
                queued: false,
                uuid: existing,
                reasons: vec![format!("Request already queued as a job (ID:{})", existing)],
            });
        }

        let job = Job::new(request, requires, run_on_dependency_failure);
        match requires {
            Some(dependency) => info!("Queued job {} ({}) after {}", job.id, job.request, dependency),
            None => info!("Queued job {} ({})", job.id, job.request),
        }
        let id = self.jobs.insert(job);

        Ok(QueueResponse {
            queued: true,
            uuid: id,
            reasons: Vec::new(),
        })
    }

    // =============================================================================
    // Ticks
    // =============================================================================

    /// Run one tick over every job
    ///
    /// Each job advances by at most one transition. Dependencies are judged
    /// on the statuses seen at the start of the tick, so a dependent reacts
    /// to its prerequisite's terminal state on the tick after it is reached.
    pub async fn submit_jobs(&mut self) -> TickReport {
        self.ticks += 1;
        let tick = self.ticks;

        let observed: HashMap<Uuid, JobStatus> = self
            .jobs
            .as_slice()
            .iter()
            .map(|job| (job.id, job.status))
            .collect();
        let mut submitted = HashSet::new();
        let client = self.client.as_ref();

        for job in self.jobs.iter_mut() {
            match plan(job, &observed) {
                Step::Skip => {}
                Step::Hold => {
                    if job.status != JobStatus::Pending {
                        debug!("Job {} waiting on {:?}", job.id, job.requires);
                    }
                    job.status = JobStatus::Pending;
                }
                Step::DependencyFailed { requires, status } => {
                    warn!("Job {} skipped: required job {} ended in {}", job.id, requires, status);
                    job.fail(
                        JobStatus::RequiredFailed,
                        format!("Required job {} ended in {}", requires, status),
                    );
                }
                Step::Submit => {
                    submit(client, job).await;
                    submitted.insert(job.id);
                }
                Step::Poll(remote_job_id) => poll(client, job, &remote_job_id).await,
                Step::Settle => {
                    info!("Job {} accepted without a remote job, marking completed", job.id);
                    job.complete();
                }
            }
        }

        debug!("Tick {} finished: {} submission(s)", tick, submitted.len());
        self.report(tick, &submitted)
    }

    /// Drive the queue until every job is terminal and return the last tick
    ///
    /// In dry-run mode exactly one tick runs, since nothing can change
    /// remotely.
    ///
    /// # Errors
    /// Returns `TickLimitExceeded` when `max_ticks` is reached first.
    pub async fn run(&mut self) -> Result<TickReport> {
        let (last, _) = self.drive(false).await?;
        Ok(last)
    }

    /// Like [`Scheduler::run`], returning every tick's report in order
    pub async fn run_logged(&mut self) -> Result<Vec<TickReport>> {
        let (_, history) = self.drive(true).await?;
        Ok(history)
    }

    async fn drive(&mut self, keep_history: bool) -> Result<(TickReport, Vec<TickReport>)> {
        let dry_run = self.client.dry_run();
        let mut history = Vec::new();
        let mut ticks = 0;

        loop {
            let report = self.submit_jobs().await;
            ticks += 1;
            if keep_history {
                history.push(report.clone());
            }

            let status = self.status();
            if dry_run || status.is_terminal() {
                info!(
                    "Queue {} after {} tick(s): {} job(s), {} failed",
                    status.label, ticks, status.job_count, status.fail_count
                );
                return Ok((report, history));
            }

            if let Some(max_ticks) = self.config.max_ticks {
                if ticks >= max_ticks {
                    warn!("Giving up after {} tick(s) with queue {}", ticks, status.label);
                    return Err(SchedulerError::TickLimitExceeded {
                        ticks,
                        status: Box::new(status),
                    });
                }
            }

            if !self.config.tick_interval.is_zero() {
                tokio::time::sleep(self.config.tick_interval).await;
            }
        }
    }

    fn report(&self, tick: u64, submitted: &HashSet<Uuid>) -> TickReport {
        let jobs = self
            .jobs
            .as_slice()
            .iter()
            .map(|job| JobTickState {
                id: job.id,
                status: job.status,
                ok: job.ok,
                remote_job_id: job.remote_job_id.clone(),
                new_submission: submitted.contains(&job.id),
            })
            .collect();

        TickReport { tick, jobs }
    }

    // =============================================================================
    // Read-only views
    // =============================================================================

    /// Aggregate status derived from the current job states
    pub fn status(&self) -> QueueStatus {
        QueueStatus::from_jobs(self.jobs.as_slice())
    }

    pub fn job(&self, id: Uuid) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Display form of a job, with its request in structural form
    pub fn snapshot(&self, id: Uuid) -> Option<JobSnapshot> {
        self.jobs.get(id).map(JobSnapshot::from)
    }

    /// All jobs in registration order
    pub fn list_jobs(&self) -> &[Job] {
        self.jobs.as_slice()
    }

    pub fn list_job_ids(&self) -> Vec<Uuid> {
        self.jobs.ids()
    }

    /// Sorted, de-duplicated remote job ids assigned so far
    pub fn list_remote_job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .jobs
            .as_slice()
            .iter()
            .filter_map(|job| job.remote_job_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Number of ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_dry_run(&self) -> bool {
        self.client.dry_run()
    }
}

fn plan(job: &Job, observed: &HashMap<Uuid, JobStatus>) -> Step {
    if job.is_settled() {
        return Step::Skip;
    }

    if job.status.is_awaiting_submission() {
        let Some(requires) = job.requires else {
            return Step::Submit;
        };
        return match observed.get(&requires) {
            // Registration rejects unknown ids, so this only blocks
            None => Step::Hold,
            Some(status) if !status.is_terminal() => Step::Hold,
            Some(status) if status.is_terminal_failure() && !job.run_on_dependency_failure => {
                Step::DependencyFailed {
                    requires,
                    status: *status,
                }
            }
            Some(_) => Step::Submit,
        };
    }

    match &job.remote_job_id {
        Some(remote_job_id) => Step::Poll(remote_job_id.clone()),
        None if job.simulated => Step::Skip,
        None => Step::Settle,
    }
}

async fn submit(client: &dyn RemoteJobClient, job: &mut Job) {
    let outcome = match client.send(&job.request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Submission of job {} failed: {}", job.id, e);
            job.last_outcome = Some(json!({ "error": e.to_string() }));
            job.fail(JobStatus::SubmitFailed, e.to_string());
            return;
        }
    };
    job.last_outcome = Some(outcome.to_value());

    match outcome {
        SubmitOutcome::Simulated(_) => {
            info!("Dry run: job {} ({}) simulated", job.id, job.request);
            job.simulated = true;
            job.status = JobStatus::Submitted;
            job.submitted_at = Some(Utc::now());
        }
        outcome if outcome.is_accepted() => {
            job.remote_job_id = outcome.remote_job_id().map(str::to_string);
            job.status = JobStatus::Submitted;
            job.submitted_at = Some(Utc::now());
            info!(
                "Job {} ({}) submitted as remote job {}",
                job.id,
                job.request,
                job.remote_job_id.as_deref().unwrap_or("-")
            );
        }
        outcome => {
            let message = outcome
                .error_message()
                .unwrap_or_else(|| "Submission rejected".to_string());
            warn!("Job {} rejected: {}", job.id, message);
            job.fail(JobStatus::SubmitFailed, message);
        }
    }
}

async fn poll(client: &dyn RemoteJobClient, job: &mut Job, remote_job_id: &str) {
    let remote = match client.poll_status(remote_job_id).await {
        Ok(remote) => remote,
        Err(e) => {
            warn!("Failed to poll remote job {} for job {}: {}", remote_job_id, job.id, e);
            return;
        }
    };
    job.last_outcome = Some(remote.raw.clone());

    match remote.local_status() {
        JobStatus::Completed => {
            info!("Job {} completed (remote job {})", job.id, remote_job_id);
            job.complete();
        }
        status if status.is_terminal_failure() => {
            let message = remote
                .error_detail
                .unwrap_or_else(|| format!("Remote job {} failed", remote_job_id));
            warn!("Job {} failed (remote job {}): {}", job.id, remote_job_id, message);
            job.fail(JobStatus::Failed, message);
        }
        status => job.status = status,
    }
}
