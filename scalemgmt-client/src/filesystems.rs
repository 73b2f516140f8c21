//! Filesystem endpoints

use crate::error::Result;
use crate::{ScaleClient, extract_list};
use crate::models::FilesystemSummary;
use scalemgmt_core::domain::request::PreparedRequest;

impl ScaleClient {
    /// Prepare `GET /filesystems[/{name}]`
    pub fn filesystems_request(&self, name: Option<&str>) -> PreparedRequest {
        let url = match name {
            Some(name) => self.endpoint(&format!("filesystems/{}", name)),
            None => self.endpoint("filesystems"),
        };
        PreparedRequest::get(&url)
    }

    /// List all filesystems, across every page
    pub async fn filesystems(&self) -> Result<Vec<FilesystemSummary>> {
        let merged = self.get_all(self.filesystems_request(None).url()).await?;
        extract_list(merged, "filesystems")
    }
}
