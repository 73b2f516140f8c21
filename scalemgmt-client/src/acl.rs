//! Access control list endpoints
//!
//! There is no bulk ACL query in the management API: every path needs its
//! own request.

use crate::ScaleClient;
use crate::error::{ClientError, Result};
use crate::models::{Acl, AclEntry};
use scalemgmt_core::domain::request::{PreparedRequest, percent_encode};
use serde_json::{Value, json};

impl ScaleClient {
    /// Prepare `GET /filesystems/{fs}/acl/{path}`
    pub fn acl_request(&self, filesystem: &str, path: &str, all_fields: bool) -> Result<PreparedRequest> {
        let request = PreparedRequest::get(&self.acl_url(filesystem, path)?);
        if all_fields {
            Ok(request.query(&[("fields", ":all:")]))
        } else {
            Ok(request)
        }
    }

    /// Fetch the ACL of a path
    pub async fn acl(&self, filesystem: &str, path: &str) -> Result<Acl> {
        let mut body: Value = self
            .get_json(self.acl_request(filesystem, path, true)?.url())
            .await?;
        let acl = body
            .get_mut("acl")
            .map(Value::take)
            .unwrap_or_else(|| json!({}));
        serde_json::from_value(acl)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid acl: {}", e)))
    }

    /// Prepare `PUT /filesystems/{fs}/acl/{path}` replacing the NFSv4 ACL
    pub fn put_acl_request(
        &self,
        filesystem: &str,
        path: &str,
        entries: &[AclEntry],
    ) -> Result<PreparedRequest> {
        Ok(PreparedRequest::put(&self.acl_url(filesystem, path)?).json(json!({
            "type": "NFSv4",
            "entries": entries,
        })))
    }

    fn acl_url(&self, filesystem: &str, path: &str) -> Result<String> {
        Ok(self.endpoint(&format!(
            "filesystems/{}/acl/{}",
            filesystem,
            acl_path_segment(path)?
        )))
    }
}

/// Encode a filesystem path as a single URL path segment
///
/// The root and the first directory (the mount prefix) are dropped and the
/// remainder is percent-encoded with no safe characters, so
/// `/gpfs/gpfs0/projects` becomes `gpfs0%2Fprojects`.
///
/// # Errors
/// Returns `PathOutsideFilesystem` when nothing remains after the prefix,
/// as for `/gpfs` or `/`.
pub fn acl_path_segment(path: &str) -> Result<String> {
    let skip = if path.starts_with('/') { 1 } else { 2 };
    let tail: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty())
        .skip(skip)
        .collect();
    if tail.is_empty() {
        return Err(ClientError::PathOutsideFilesystem(path.to_string()));
    }
    Ok(percent_encode(&tail.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalemgmt_core::domain::request::Method;

    fn client() -> ScaleClient {
        ScaleClient::with_client("https://gui:443/scalemgmt/v2", reqwest::Client::new())
    }

    #[test]
    fn test_acl_path_segment() {
        assert_eq!(acl_path_segment("/gpfs/gpfs0/projects/x").unwrap(), "gpfs0%2Fprojects%2Fx");
        assert_eq!(acl_path_segment("/gpfs/gpfs0/").unwrap(), "gpfs0");
        assert_eq!(acl_path_segment("gpfs/gpfs0/projects").unwrap(), "projects");
    }

    #[test]
    fn test_mount_prefix_alone_is_rejected() {
        for path in ["/gpfs", "/gpfs/", "/", "", "gpfs/gpfs0"] {
            assert!(
                matches!(acl_path_segment(path), Err(ClientError::PathOutsideFilesystem(p)) if p == path),
                "{:?} should be rejected",
                path
            );
        }
        assert!(client().put_acl_request("gpfs0", "/gpfs", &[]).is_err());
    }

    #[test]
    fn test_acl_request_all_fields() {
        let request = client().acl_request("gpfs0", "/gpfs/gpfs0/projects", true).unwrap();
        assert_eq!(request.method(), Method::Get);
        assert_eq!(
            request.url(),
            "https://gui/scalemgmt/v2/filesystems/gpfs0/acl/gpfs0%2Fprojects?fields=%3Aall%3A"
        );
    }

    #[test]
    fn test_put_acl_request() {
        let entries = vec![
            AclEntry::allow("special:owner@", "rwmxDaAnNcCos", ""),
            AclEntry::allow("group:apps-team", "rxancs", "fdi"),
        ];
        let request = client()
            .put_acl_request("gpfs0", "/gpfs/gpfs0/projects", &entries)
            .unwrap();

        assert_eq!(request.method(), Method::Put);
        assert_eq!(
            request.url(),
            "https://gui/scalemgmt/v2/filesystems/gpfs0/acl/gpfs0%2Fprojects"
        );
        let body = request.body().unwrap();
        assert_eq!(body["type"], "NFSv4");
        assert_eq!(body["entries"][1]["who"], "group:apps-team");
        assert_eq!(body["entries"][1]["type"], "allow");
        assert_eq!(body["entries"][1]["flags"], "fdi");
    }
}
