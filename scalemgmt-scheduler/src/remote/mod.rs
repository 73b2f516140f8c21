//! Remote job client layer
//!
//! The scheduler never talks HTTP itself. It sends prepared requests and
//! polls remote jobs through the [`RemoteJobClient`] trait, which keeps the
//! state machine testable without a management server.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::HttpRemoteJobClient;

use async_trait::async_trait;
use scalemgmt_client::ClientError;
use scalemgmt_core::domain::outcome::{RemoteJobStatus, SubmitOutcome};
use scalemgmt_core::domain::request::PreparedRequest;

/// Submission and polling interface of the remote management system
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Sends a prepared request
    ///
    /// In dry-run mode this returns [`SubmitOutcome::Simulated`] without
    /// contacting the remote system. A non-accepted live outcome and an
    /// `Err` are both treated as a rejected submission by the scheduler.
    async fn send(&self, request: &PreparedRequest) -> Result<SubmitOutcome, ClientError>;

    /// Polls the status of a remote job
    ///
    /// # Arguments
    /// * `remote_job_id` - The identifier returned when the request was accepted
    async fn poll_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, ClientError>;

    /// Whether submissions are simulated
    fn dry_run(&self) -> bool;
}
