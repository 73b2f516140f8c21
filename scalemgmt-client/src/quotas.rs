//! Quota endpoints

use crate::ScaleClient;
use crate::error::Result;
use crate::models::{QuotaEntry, QuotaLimits};
use scalemgmt_core::domain::request::PreparedRequest;
use serde_json::json;

impl ScaleClient {
    /// Prepare `GET /filesystems/{fs}[/filesets/{fileset}]/quotas`
    pub fn quotas_request(
        &self,
        filesystem: &str,
        fileset: Option<&str>,
        filter: Option<&str>,
        all_fields: bool,
    ) -> PreparedRequest {
        let url = match fileset {
            Some(fileset) => self.endpoint(&format!(
                "filesystems/{}/filesets/{}/quotas",
                filesystem, fileset
            )),
            None => self.endpoint(&format!("filesystems/{}/quotas", filesystem)),
        };

        let mut params = Vec::new();
        if all_fields {
            params.push(("fields", ":all:"));
        }
        if let Some(filter) = filter {
            params.push(("filter", filter));
        }
        PreparedRequest::get(&url).query(&params)
    }

    /// Fetch quotas, across every page
    pub async fn quotas(
        &self,
        filesystem: &str,
        fileset: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Vec<QuotaEntry>> {
        let request = self.quotas_request(filesystem, fileset, filter, true);
        let merged = self.get_all(request.url()).await?;
        crate::extract_list(merged, "quotas")
    }

    /// Prepare `POST /filesystems/{fs}/quotas` setting the given limits
    pub fn set_quota_request(&self, limits: &QuotaLimits) -> PreparedRequest {
        let url = self.endpoint(&format!("filesystems/{}/quotas", limits.filesystem));

        let mut body = json!(limits);
        if let Some(map) = body.as_object_mut() {
            map.insert("operationType".into(), json!("setQuota"));
        }

        PreparedRequest::post(&url).json(body)
    }
}
