//! Job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::job::{Job, JobStatus};

/// Display form of a job, with its request as a plain
/// `{method, url, headers, body}` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub ok: bool,
    pub error: Option<String>,
    pub remote_job_id: Option<String>,
    pub requires: Option<Uuid>,
    pub run_on_dependency_failure: bool,
    pub simulated: bool,
    pub request: Value,
    pub last_outcome: Option<Value>,
    pub queued_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            ok: job.ok,
            error: job.error.clone(),
            remote_job_id: job.remote_job_id.clone(),
            requires: job.requires,
            run_on_dependency_failure: job.run_on_dependency_failure,
            simulated: job.simulated,
            request: job.request.to_value(),
            last_outcome: job.last_outcome.clone(),
            queued_at: job.queued_at,
            submitted_at: job.submitted_at,
            finished_at: job.finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::PreparedRequest;
    use serde_json::json;

    #[test]
    fn test_snapshot_has_structural_request() {
        let request = PreparedRequest::post("https://GUI/scalemgmt/v2/filesystems/gpfs0/filesets/")
            .json(json!({"filesetName": "apps"}));
        let job = Job::new(request, None, false);

        let snapshot = JobSnapshot::from(&job);

        assert_eq!(snapshot.id, job.id);
        assert_eq!(snapshot.status, JobStatus::New);
        assert!(!snapshot.run_on_dependency_failure);
        assert_eq!(snapshot.request["method"], "POST");
        assert_eq!(
            snapshot.request["url"],
            "https://gui/scalemgmt/v2/filesystems/gpfs0/filesets"
        );
        assert_eq!(snapshot.request["body"]["filesetName"], "apps");
    }
}
