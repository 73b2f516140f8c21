//! HTTP remote job client
//!
//! Sends prepared requests with [`ScaleClient`] and polls `GET /jobs/{id}`.

use async_trait::async_trait;
use scalemgmt_client::{ClientError, ScaleClient};
use scalemgmt_core::domain::outcome::{RemoteJobStatus, SubmitOutcome};
use scalemgmt_core::domain::request::PreparedRequest;
use tracing::debug;

use super::RemoteJobClient;

/// HTTP implementation of RemoteJobClient
pub struct HttpRemoteJobClient {
    client: ScaleClient,
    dry_run: bool,
}

impl HttpRemoteJobClient {
    /// Creates a new HTTP remote job client
    ///
    /// # Arguments
    /// * `client` - Connected management API client
    /// * `dry_run` - Simulate submissions instead of sending them
    pub fn new(client: ScaleClient, dry_run: bool) -> Self {
        Self { client, dry_run }
    }
}

#[async_trait]
impl RemoteJobClient for HttpRemoteJobClient {
    async fn send(&self, request: &PreparedRequest) -> Result<SubmitOutcome, ClientError> {
        if self.dry_run {
            debug!("Dry run, not sending {}", request);
            return Ok(SubmitOutcome::Simulated(request.clone()));
        }

        let (status, body) = self.client.execute(request).await?;
        debug!("{} answered with HTTP {}", request, status);

        Ok(SubmitOutcome::from_response(status, body))
    }

    async fn poll_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, ClientError> {
        self.client.job_status(remote_job_id).await
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalemgmt_client::ConnectionSettings;
    use serde_json::json;

    #[tokio::test]
    async fn test_dry_run_send_is_simulated() {
        // Nothing listens on this address; a real send would fail.
        let settings = ConnectionSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..ConnectionSettings::default()
        };
        let scale = ScaleClient::new(&settings).unwrap();
        let remote = HttpRemoteJobClient::new(scale, true);

        let request = PreparedRequest::post("https://127.0.0.1:1/scalemgmt/v2/filesystems/gpfs0/filesets")
            .json(json!({"filesetName": "projects"}));
        let outcome = remote.send(&request).await.unwrap();

        assert!(remote.dry_run());
        assert_eq!(outcome, SubmitOutcome::Simulated(request));
        assert_eq!(outcome.remote_job_id(), None);
    }
}
