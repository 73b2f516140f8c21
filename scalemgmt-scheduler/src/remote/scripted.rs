//! Scripted in-memory remote client for scheduler tests

use async_trait::async_trait;
use scalemgmt_client::ClientError;
use scalemgmt_core::domain::outcome::{RemoteJobState, RemoteJobStatus, SubmitOutcome};
use scalemgmt_core::domain::request::PreparedRequest;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::RemoteJobClient;

enum Reply {
    Accept(Option<String>),
    Reject(u16, String),
    Unreachable(String),
}

/// Replies to submissions by URL and to polls by remote job id
///
/// Unscripted submissions are accepted with remote id `remote-{n}`;
/// unscripted polls report `RUNNING`. The last scripted poll reply for a
/// remote job repeats once the script is exhausted.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    dry_run: bool,
    replies: Mutex<HashMap<String, Reply>>,
    polls: Mutex<HashMap<String, VecDeque<Result<RemoteJobStatus, String>>>>,
    sent: Mutex<Vec<PreparedRequest>>,
    polled: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn simulated() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn accept(self, url: &str, remote_id: &str) -> Self {
        self.reply(url, Reply::Accept(Some(remote_id.to_string())))
    }

    pub fn accept_without_id(self, url: &str) -> Self {
        self.reply(url, Reply::Accept(None))
    }

    pub fn reject(self, url: &str, status: u16, message: &str) -> Self {
        self.reply(url, Reply::Reject(status, message.to_string()))
    }

    pub fn unreachable(self, url: &str, message: &str) -> Self {
        self.reply(url, Reply::Unreachable(message.to_string()))
    }

    /// Queue poll replies for a remote job, in order
    pub fn polls(self, remote_id: &str, states: &[(RemoteJobState, Option<&str>)]) -> Self {
        let replies = states
            .iter()
            .map(|(state, detail)| Ok(RemoteJobStatus::new(*state, detail.map(str::to_string))))
            .collect();
        self.polls.lock().unwrap().insert(remote_id.to_string(), replies);
        self
    }

    /// Make the next poll of a remote job fail at the transport level
    pub fn poll_error(self, remote_id: &str, message: &str) -> Self {
        self.polls
            .lock()
            .unwrap()
            .entry(remote_id.to_string())
            .or_default()
            .push_front(Err(message.to_string()));
        self
    }

    fn reply(self, url: &str, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    /// URLs of every request passed to `send`, in order
    pub fn sent_urls(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.url().to_string())
            .collect()
    }

    pub fn poll_count(&self) -> usize {
        self.polled.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedClient {
    async fn send(&self, request: &PreparedRequest) -> Result<SubmitOutcome, ClientError> {
        if self.dry_run {
            return Ok(SubmitOutcome::Simulated(request.clone()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(request.clone());
        let fallback = format!("remote-{}", sent.len());
        drop(sent);

        match self.replies.lock().unwrap().get(request.url()) {
            Some(Reply::Accept(Some(id))) => Ok(SubmitOutcome::from_response(
                202,
                json!({"jobs": [{"jobId": id, "status": "RUNNING"}]}),
            )),
            Some(Reply::Accept(None)) => Ok(SubmitOutcome::from_response(
                200,
                json!({"status": {"code": 200, "message": "done"}}),
            )),
            Some(Reply::Reject(status, message)) => Ok(SubmitOutcome::from_response(
                *status,
                json!({"status": {"code": status, "message": message}}),
            )),
            Some(Reply::Unreachable(reason)) => Err(ClientError::Unreachable {
                target: request.url().to_string(),
                reason: reason.clone(),
            }),
            None => Ok(SubmitOutcome::from_response(
                202,
                json!({"jobs": [{"jobId": fallback, "status": "RUNNING"}]}),
            )),
        }
    }

    async fn poll_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, ClientError> {
        self.polled.lock().unwrap().push(remote_job_id.to_string());

        let mut polls = self.polls.lock().unwrap();
        let Some(queue) = polls.get_mut(remote_job_id) else {
            return Ok(RemoteJobStatus::new(RemoteJobState::Running, None));
        };

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match reply {
            Some(Ok(status)) => Ok(status),
            Some(Err(reason)) => Err(ClientError::Unreachable {
                target: format!("jobs/{}", remote_job_id),
                reason,
            }),
            None => Ok(RemoteJobStatus::new(RemoteJobState::Running, None)),
        }
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}
