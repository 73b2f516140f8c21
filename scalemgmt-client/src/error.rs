//! Error types for the management API client
//!
//! A rejected *submission* is not an error here: `execute` hands back the
//! status and body so the scheduler can record the rejection on the job.
//! These variants cover reads that fail and requests that never complete.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No connection could be made, or the server did not answer in time
    #[error("Cannot reach {target}: {reason}")]
    Unreachable { target: String, reason: String },

    /// Any other failure while sending a request or reading its response
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A read was answered with a non-2xx status
    #[error("Management API refused the request (status {status}): {message}")]
    Refused { status: u16, message: String },

    /// The server does not know the remote job id
    #[error("Remote job {0} does not exist")]
    JobNotFound(String),

    /// The body was not the JSON shape the endpoint documents
    #[error("Unexpected response body: {0}")]
    MalformedResponse(String),

    /// A path with no component below the filesystem mount
    #[error("Path {0:?} does not name anything below a filesystem mount")]
    PathOutsideFilesystem(String),

    /// The configured CA bundle cannot be used
    #[error("Cannot use CA bundle {}: {reason}", .path.display())]
    CaBundle { path: PathBuf, reason: String },
}

impl ClientError {
    pub fn refused(status: u16, message: impl Into<String>) -> Self {
        Self::Refused {
            status,
            message: message.into(),
        }
    }

    /// Classify a reqwest failure for `target`
    ///
    /// Connect failures and timeouts become `Unreachable`, which is what an
    /// operator needs to see first; everything else stays a transport error.
    pub fn transport(target: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable {
                target: target.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Transport(err)
        }
    }

    /// Check if this error is a "not found" answer
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Refused { status: 404, .. } | Self::JobNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(ClientError::refused(404, "gone").is_not_found());
        assert!(ClientError::JobNotFound("12".into()).is_not_found());
        assert!(!ClientError::refused(409, "conflict").is_not_found());
        assert!(!ClientError::MalformedResponse("x".into()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::refused(403, "Forbidden");
        assert_eq!(
            err.to_string(),
            "Management API refused the request (status 403): Forbidden"
        );

        let err = ClientError::CaBundle {
            path: PathBuf::from("/etc/scale/ca.pem"),
            reason: "no PEM certificate found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot use CA bundle /etc/scale/ca.pem: no PEM certificate found"
        );
    }
}
