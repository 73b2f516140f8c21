//! Queue DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::job::{Job, JobStatus};

/// Answer to a registration request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueResponse {
    /// `false` when an equal request was already queued
    pub queued: bool,
    /// The new job's id, or the id of the job that already holds the request
    pub uuid: Uuid,
    /// Informational reasons (e.g. which job the request duplicates)
    pub reasons: Vec<String>,
}

/// State of one job after a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTickState {
    pub id: Uuid,
    pub status: JobStatus,
    pub ok: bool,
    pub remote_job_id: Option<String>,
    /// The request was sent to the remote system during this tick
    pub new_submission: bool,
}

/// Snapshot of every job taken at the end of a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick counter of the scheduler that produced the report
    pub tick: u64,
    /// Jobs in registration order
    pub jobs: Vec<JobTickState>,
}

impl TickReport {
    pub fn get(&self, id: Uuid) -> Option<&JobTickState> {
        self.jobs.iter().find(|state| state.id == id)
    }

    /// Number of requests sent during this tick
    pub fn submissions(&self) -> usize {
        self.jobs.iter().filter(|state| state.new_submission).count()
    }
}

/// Aggregate label of the whole queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateLabel {
    /// No jobs registered
    Empty,
    /// Jobs queued, none submitted or finished yet
    Pending,
    /// Some work submitted or finished, not everything terminal
    Running,
    /// Every job terminal
    Completed,
}

impl std::fmt::Display for AggregateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateLabel::Empty => write!(f, "EMPTY"),
            AggregateLabel::Pending => write!(f, "PENDING"),
            AggregateLabel::Running => write!(f, "RUNNING"),
            AggregateLabel::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Aggregate status derived from the job collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub label: AggregateLabel,
    pub job_count: usize,
    /// Awaiting submission (`NEW` or `PENDING`)
    pub new_count: usize,
    /// Submitted and not yet terminal
    pub running_count: usize,
    /// Terminal, successful or not
    pub complete_count: usize,
    pub fail_count: usize,
    /// Failure message per failed job
    pub fail_reports: BTreeMap<Uuid, String>,
}

impl QueueStatus {
    pub fn from_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut status = QueueStatus {
            label: AggregateLabel::Empty,
            job_count: 0,
            new_count: 0,
            running_count: 0,
            complete_count: 0,
            fail_count: 0,
            fail_reports: BTreeMap::new(),
        };

        for job in jobs {
            status.job_count += 1;
            if job.status.is_awaiting_submission() {
                status.new_count += 1;
            } else if job.status.is_post_submission() {
                status.running_count += 1;
            } else {
                status.complete_count += 1;
            }

            if job.status.is_terminal_failure() {
                status.fail_count += 1;
                let message = job
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("job ended in {}", job.status));
                status.fail_reports.insert(job.id, message);
            }
        }

        status.label = if status.job_count == 0 {
            AggregateLabel::Empty
        } else if status.complete_count == status.job_count {
            AggregateLabel::Completed
        } else if status.running_count == 0 && status.complete_count == 0 {
            AggregateLabel::Pending
        } else {
            AggregateLabel::Running
        };

        status
    }

    /// Whether a driver loop can stop: nothing registered or everything terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self.label, AggregateLabel::Empty | AggregateLabel::Completed)
    }

    pub fn succeeded(&self) -> bool {
        self.is_terminal() && self.fail_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::PreparedRequest;

    fn job(status: JobStatus) -> Job {
        let mut job = Job::new(PreparedRequest::get("https://host/x"), None, true);
        job.status = status;
        job
    }

    #[test]
    fn test_empty_queue() {
        let status = QueueStatus::from_jobs(&Vec::<Job>::new());
        assert_eq!(status.label, AggregateLabel::Empty);
        assert!(status.is_terminal());
        assert!(status.succeeded());
    }

    #[test]
    fn test_pending_when_nothing_started() {
        let jobs = vec![job(JobStatus::New), job(JobStatus::Pending)];
        let status = QueueStatus::from_jobs(&jobs);
        assert_eq!(status.label, AggregateLabel::Pending);
        assert_eq!(status.new_count, 2);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_running_when_partially_done() {
        let jobs = vec![job(JobStatus::Completed), job(JobStatus::Pending)];
        let status = QueueStatus::from_jobs(&jobs);
        assert_eq!(status.label, AggregateLabel::Running);
        assert_eq!(status.complete_count, 1);
    }

    #[test]
    fn test_completed_with_failure_reports() {
        let mut failed = job(JobStatus::New);
        failed.fail(JobStatus::SubmitFailed, "HTTP 400: bad request");
        let jobs = vec![failed.clone(), job(JobStatus::Completed), job(JobStatus::Completed)];

        let status = QueueStatus::from_jobs(&jobs);
        assert_eq!(status.label, AggregateLabel::Completed);
        assert_eq!(status.fail_count, 1);
        assert_eq!(status.complete_count, 3);
        assert_eq!(status.fail_reports.len(), 1);
        assert_eq!(
            status.fail_reports.get(&failed.id).map(String::as_str),
            Some("HTTP 400: bad request")
        );
        assert!(!status.succeeded());
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(
            serde_json::to_string(&AggregateLabel::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }
}
