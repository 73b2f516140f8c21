//! Fileset endpoints

use crate::error::Result;
use crate::models::{FilesetSummary, NewFileset};
use crate::{ScaleClient, extract_list};
use scalemgmt_core::domain::request::PreparedRequest;
use serde_json::{Map, Value, json};

impl ScaleClient {
    /// Prepare `GET /filesystems/{fs}/filesets[/{fileset}]`
    ///
    /// # Arguments
    /// * `filesystem` - The filesystem name
    /// * `fileset` - A single fileset, or all filesets when `None`
    /// * `all_fields` - Request every field (`fields=:all:`), including `config.path`
    pub fn filesets_request(
        &self,
        filesystem: &str,
        fileset: Option<&str>,
        all_fields: bool,
    ) -> PreparedRequest {
        let url = match fileset {
            Some(fileset) => self.endpoint(&format!("filesystems/{}/filesets/{}", filesystem, fileset)),
            None => self.endpoint(&format!("filesystems/{}/filesets", filesystem)),
        };
        let request = PreparedRequest::get(&url);
        if all_fields {
            request.query(&[("fields", ":all:")])
        } else {
            request
        }
    }

    /// List the filesets of a filesystem, across every page
    pub async fn filesets(&self, filesystem: &str, all_fields: bool) -> Result<Vec<FilesetSummary>> {
        let request = self.filesets_request(filesystem, None, all_fields);
        let merged = self.get_all(request.url()).await?;
        extract_list(merged, "filesets")
    }

    /// Prepare `POST /filesystems/{fs}/filesets`
    ///
    /// The returned request is not sent; queue it with the job scheduler.
    pub fn create_fileset_request(&self, fileset: &NewFileset) -> PreparedRequest {
        let url = self.endpoint(&format!("filesystems/{}/filesets", fileset.filesystem));

        let mut body = Map::new();
        body.insert("filesetName".into(), json!(fileset.fileset));
        body.insert("path".into(), json!(fileset.path));
        body.insert("owner".into(), json!(format!("{}:{}", fileset.owner, fileset.group)));
        body.insert("permissions".into(), json!(fileset.permissions));
        body.insert("permissionChangeMode".into(), json!(fileset.permission_change_mode));
        body.insert("inodeSpace".into(), json!(fileset.inode_space));
        if let Some(comment) = &fileset.comment {
            body.insert("comment".into(), json!(comment));
        }

        PreparedRequest::post(&url).json(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalemgmt_core::domain::request::Method;

    fn client() -> ScaleClient {
        ScaleClient::with_client("https://gui:443/scalemgmt/v2", reqwest::Client::new())
    }

    #[test]
    fn test_filesets_request_all_fields() {
        let request = client().filesets_request("gpfs0", None, true);
        assert_eq!(
            request.url(),
            "https://gui/scalemgmt/v2/filesystems/gpfs0/filesets?fields=%3Aall%3A"
        );
    }

    #[test]
    fn test_create_fileset_request() {
        let mut new = NewFileset::new("gpfs0", "projects", "/gpfs/gpfs0/projects");
        new.comment = Some("team space".to_string());

        let request = client().create_fileset_request(&new);
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.url(), "https://gui/scalemgmt/v2/filesystems/gpfs0/filesets");

        let body = request.body().unwrap();
        assert_eq!(body["filesetName"], "projects");
        assert_eq!(body["owner"], "root:root");
        assert_eq!(body["permissions"], "0750");
        assert_eq!(body["permissionChangeMode"], "chmodAndUpdateAcl");
        assert_eq!(body["inodeSpace"], "new");
        assert_eq!(body["comment"], "team space");
    }

    #[test]
    fn test_same_fileset_prepares_equal_requests() {
        let new = NewFileset::new("gpfs0", "projects", "/gpfs/gpfs0/projects");
        assert_eq!(
            client().create_fileset_request(&new),
            client().create_fileset_request(&new)
        );
    }
}
