//! Remote job endpoints

use crate::error::{ClientError, Result};
use crate::{ScaleClient, extract_list};
use scalemgmt_core::domain::outcome::RemoteJobStatus;
use scalemgmt_core::domain::request::PreparedRequest;
use serde_json::Value;

impl ScaleClient {
    /// Prepare `GET /jobs[/{id}]`
    pub fn jobs_request(&self, job_id: Option<&str>) -> PreparedRequest {
        let url = match job_id {
            Some(id) => self.endpoint(&format!("jobs/{}", id)),
            None => self.endpoint("jobs"),
        };
        PreparedRequest::get(&url)
    }

    /// Poll the status of a remote job
    ///
    /// # Arguments
    /// * `job_id` - Identifier assigned by the server when the job was accepted
    ///
    /// # Errors
    /// Returns `JobNotFound` when the server answers 404.
    pub async fn job_status(&self, job_id: &str) -> Result<RemoteJobStatus> {
        let body: Value = self
            .get_json(self.jobs_request(Some(job_id)).url())
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => ClientError::JobNotFound(job_id.to_string()),
                e => e,
            })?;
        Ok(RemoteJobStatus::from_job_body(body))
    }

    /// List remote jobs, across every page
    pub async fn jobs(&self) -> Result<Vec<Value>> {
        let merged = self.get_all(self.jobs_request(None).url()).await?;
        extract_list(merged, "jobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_request() {
        let client = ScaleClient::with_client("https://gui:443/scalemgmt/v2", reqwest::Client::new());
        assert_eq!(
            client.jobs_request(Some("1000000000002")).url(),
            "https://gui/scalemgmt/v2/jobs/1000000000002"
        );
        assert_eq!(client.jobs_request(None).url(), "https://gui/scalemgmt/v2/jobs");
    }
}
