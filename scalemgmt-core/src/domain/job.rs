//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::request::PreparedRequest;

/// A locally tracked unit of work
///
/// Wraps one prepared request plus an optional dependency on another job.
/// Created by registration only and never removed for the lifetime of the
/// scheduler that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub request: PreparedRequest,
    pub status: JobStatus,
    /// Identifier assigned by the remote system once the request is accepted
    pub remote_job_id: Option<String>,
    pub requires: Option<Uuid>,
    pub run_on_dependency_failure: bool,
    pub ok: bool,
    pub error: Option<String>,
    /// Most recent raw submission or polling result
    pub last_outcome: Option<Value>,
    /// Submitted in dry-run mode, so no remote job exists
    pub simulated: bool,
    pub queued_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(request: PreparedRequest, requires: Option<Uuid>, run_on_dependency_failure: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            status: JobStatus::New,
            remote_job_id: None,
            requires,
            run_on_dependency_failure,
            ok: true,
            error: None,
            last_outcome: None,
            simulated: false,
            queued_at: Utc::now(),
            submitted_at: None,
            finished_at: None,
        }
    }

    /// Move to a terminal failure state and record the message
    ///
    /// The error is only recorded the first time a job becomes unhealthy.
    pub fn fail(&mut self, status: JobStatus, message: impl Into<String>) {
        debug_assert!(status.is_terminal_failure());
        self.status = status;
        if self.ok {
            self.ok = false;
            self.error = Some(message.into());
        }
        self.finished_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Whether the scheduler has nothing left to do for this job
    pub fn is_settled(&self) -> bool {
        self.status.is_terminal() || !self.ok
    }
}

/// Lifecycle state of a locally tracked job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    New,
    Pending,
    Submitted,
    SubmitFailed,
    RequiredFailed,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// `NEW` or `PENDING`
    pub fn is_awaiting_submission(&self) -> bool {
        matches!(self, JobStatus::New | JobStatus::Pending)
    }

    /// `SUBMITTED` or `RUNNING`, the only states whose remote job is polled
    pub fn is_post_submission(&self) -> bool {
        matches!(self, JobStatus::Submitted | JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal_success() || self.is_terminal_failure()
    }

    pub fn is_terminal_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            JobStatus::SubmitFailed | JobStatus::RequiredFailed | JobStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "NEW",
            JobStatus::Pending => "PENDING",
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::SubmitFailed => "SUBMIT_FAILED",
            JobStatus::RequiredFailed => "REQUIRED_FAILED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
