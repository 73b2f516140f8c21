//! Submission outcomes and remote job state
//!
//! What the remote job client hands back to the scheduler: the result of
//! sending a prepared request, and the status of a remote job when polled.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::job::JobStatus;
use super::request::PreparedRequest;

/// Result of sending a prepared request
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Dry-run: the request was serialized, not transmitted
    Simulated(PreparedRequest),
    /// The request reached the remote system
    Live {
        accepted: bool,
        status_code: u16,
        body: Value,
        remote_job_id: Option<String>,
    },
}

impl SubmitOutcome {
    /// Build a live outcome from an HTTP status code and decoded body
    ///
    /// Any 2xx status counts as accepted. The remote job identifier is read
    /// from `jobs[0].jobId`, which the management API returns either as a
    /// number or a string.
    pub fn from_response(status_code: u16, body: Value) -> Self {
        let accepted = (200..300).contains(&status_code);
        let remote_job_id = first_job(&body)
            .and_then(|job| job.get("jobId"))
            .and_then(id_to_string);

        SubmitOutcome::Live {
            accepted,
            status_code,
            body,
            remote_job_id,
        }
    }

    pub fn is_accepted(&self) -> bool {
        match self {
            SubmitOutcome::Simulated(_) => true,
            SubmitOutcome::Live { accepted, .. } => *accepted,
        }
    }

    pub fn remote_job_id(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Simulated(_) => None,
            SubmitOutcome::Live { remote_job_id, .. } => remote_job_id.as_deref(),
        }
    }

    /// Failure message for a rejected submission, `None` when accepted
    pub fn error_message(&self) -> Option<String> {
        match self {
            SubmitOutcome::Live {
                accepted: false,
                status_code,
                body,
                ..
            } => {
                let message = body
                    .pointer("/status/message")
                    .or_else(|| body.get("message"))
                    .and_then(Value::as_str);
                Some(match message {
                    Some(message) => format!("HTTP {}: {}", status_code, message),
                    None => format!("HTTP {}", status_code),
                })
            }
            _ => None,
        }
    }

    /// Raw form retained on the job for diagnostics
    pub fn to_value(&self) -> Value {
        match self {
            SubmitOutcome::Simulated(request) => {
                let mut value = request.to_value();
                if let Some(map) = value.as_object_mut() {
                    map.insert("simulated".to_string(), Value::Bool(true));
                }
                value
            }
            SubmitOutcome::Live {
                accepted,
                status_code,
                body,
                remote_job_id,
            } => json!({
                "accepted": accepted,
                "status_code": status_code,
                "body": body,
                "remote_job_id": remote_job_id,
            }),
        }
    }
}

/// Job state as reported by the remote management system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteJobState {
    Running,
    Cancelling,
    Cancelled,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl RemoteJobState {
    /// Map onto the local lifecycle (`RUNNING`, `COMPLETED` or `FAILED`)
    ///
    /// Unrecognized states keep the job running so it is polled again.
    pub fn local_status(&self) -> JobStatus {
        match self {
            RemoteJobState::Running | RemoteJobState::Cancelling | RemoteJobState::Unknown => {
                JobStatus::Running
            }
            RemoteJobState::Completed => JobStatus::Completed,
            RemoteJobState::Failed | RemoteJobState::Cancelled => JobStatus::Failed,
        }
    }
}

/// Result of polling a remote job
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJobStatus {
    pub state: RemoteJobState,
    pub error_detail: Option<String>,
    pub raw: Value,
}

impl RemoteJobStatus {
    pub fn new(state: RemoteJobState, error_detail: Option<String>) -> Self {
        Self {
            state,
            error_detail,
            raw: Value::Null,
        }
    }

    /// Parse the body of a `GET /jobs/{id}` response
    ///
    /// Accepts either the wrapped form (`{"jobs": [ {...} ], "status": {...}}`)
    /// or a bare job object. Only a failed or cancelled job carries an error
    /// detail: its stderr, falling back to its exit code and then to the
    /// response status message.
    pub fn from_job_body(body: Value) -> Self {
        let job = first_job(&body).unwrap_or(&body);

        let state = job
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| serde_json::from_value(Value::String(s.to_ascii_uppercase())).ok())
            .unwrap_or(RemoteJobState::Unknown);

        let stderr = job
            .pointer("/result/stderr")
            .and_then(Value::as_array)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|joined| !joined.is_empty());

        let exit_code = job
            .pointer("/result/exitCode")
            .and_then(Value::as_i64)
            .filter(|code| *code != 0)
            .map(|code| format!("remote command exited with code {}", code));

        let cancelled = (state == RemoteJobState::Cancelled)
            .then(|| "remote job was cancelled".to_string());

        let status_message = body
            .pointer("/status/message")
            .and_then(Value::as_str)
            .map(str::to_string);

        let error_detail = if state.local_status().is_terminal_failure() {
            stderr.or(exit_code).or(cancelled).or(status_message)
        } else {
            None
        };

        Self {
            state,
            error_detail,
            raw: body,
        }
    }

    pub fn local_status(&self) -> JobStatus {
        self.state.local_status()
    }
}

fn first_job(body: &Value) -> Option<&Value> {
    match body.get("jobs") {
        Some(Value::Array(jobs)) => jobs.first(),
        Some(job @ Value::Object(_)) => Some(job),
        _ => None,
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_response_extracts_numeric_job_id() {
        let outcome = SubmitOutcome::from_response(
            202,
            json!({
                "jobs": [{"jobId": 1000000000003u64, "status": "RUNNING"}],
                "status": {"code": 202, "message": "The request was accepted for processing."}
            }),
        );
        assert!(outcome.is_accepted());
        assert_eq!(outcome.remote_job_id(), Some("1000000000003"));
        assert_eq!(outcome.error_message(), None);
    }

    #[test]
    fn test_rejected_response_message() {
        let outcome = SubmitOutcome::from_response(
            400,
            json!({"status": {"code": 400, "message": "Fileset already exists."}}),
        );
        assert!(!outcome.is_accepted());
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("HTTP 400: Fileset already exists.")
        );
    }

    #[test]
    fn test_rejected_response_without_body() {
        let outcome = SubmitOutcome::from_response(503, Value::Null);
        assert_eq!(outcome.error_message().as_deref(), Some("HTTP 503"));
        assert_eq!(outcome.remote_job_id(), None);
    }

    #[test]
    fn test_simulated_outcome_snapshot() {
        let request = PreparedRequest::post("https://host/filesets").json(json!({"filesetName": "a"}));
        let outcome = SubmitOutcome::Simulated(request);
        let value = outcome.to_value();
        assert_eq!(value["simulated"], true);
        assert_eq!(value["method"], "POST");
        assert_eq!(value["body"]["filesetName"], "a");
        assert_eq!(outcome.remote_job_id(), None);
    }

    #[test]
    fn test_remote_state_mapping() {
        assert_eq!(RemoteJobState::Running.local_status(), JobStatus::Running);
        assert_eq!(RemoteJobState::Cancelling.local_status(), JobStatus::Running);
        assert_eq!(RemoteJobState::Completed.local_status(), JobStatus::Completed);
        assert_eq!(RemoteJobState::Failed.local_status(), JobStatus::Failed);
        assert_eq!(RemoteJobState::Cancelled.local_status(), JobStatus::Failed);
        assert_eq!(RemoteJobState::Unknown.local_status(), JobStatus::Running);
    }

    #[test]
    fn test_failed_job_body_uses_stderr() {
        let status = RemoteJobStatus::from_job_body(json!({
            "jobs": [{
                "jobId": 12,
                "status": "FAILED",
                "result": {
                    "stderr": ["EFSSG0072C disk quota exceeded ", ""],
                    "exitCode": 1
                }
            }],
            "status": {"code": 200, "message": "The request finished successfully."}
        }));
        assert_eq!(status.state, RemoteJobState::Failed);
        assert_eq!(status.error_detail.as_deref(), Some("EFSSG0072C disk quota exceeded"));
    }

    #[test]
    fn test_failed_job_body_falls_back_to_exit_code() {
        let status = RemoteJobStatus::from_job_body(json!({
            "jobs": [{"status": "failed", "result": {"stderr": [], "exitCode": 2}}]
        }));
        assert_eq!(status.state, RemoteJobState::Failed);
        assert_eq!(
            status.error_detail.as_deref(),
            Some("remote command exited with code 2")
        );
    }

    #[test]
    fn test_completed_job_body_has_no_error_detail() {
        let status = RemoteJobStatus::from_job_body(json!({
            "jobs": [{"jobId": 14, "status": "COMPLETED", "result": {"stderr": [], "exitCode": 0}}],
            "status": {"code": 200, "message": "The request finished successfully."}
        }));
        assert_eq!(status.state, RemoteJobState::Completed);
        assert_eq!(status.error_detail, None);
    }

    #[test]
    fn test_running_job_body_ignores_partial_stderr() {
        let status = RemoteJobStatus::from_job_body(json!({
            "jobs": [{"status": "RUNNING", "result": {"stderr": ["still working"]}}]
        }));
        assert_eq!(status.local_status(), JobStatus::Running);
        assert_eq!(status.error_detail, None);
    }

    #[test]
    fn test_cancelled_job_body_detail() {
        let status = RemoteJobStatus::from_job_body(json!({"jobs": [{"status": "CANCELLED"}]}));
        assert_eq!(status.error_detail.as_deref(), Some("remote job was cancelled"));
    }

    #[test]
    fn test_unrecognized_state_is_unknown() {
        let status = RemoteJobStatus::from_job_body(json!({"status": "QUEUED_SOMEWHERE"}));
        assert_eq!(status.state, RemoteJobState::Unknown);
        assert_eq!(status.local_status(), JobStatus::Running);
    }
}
