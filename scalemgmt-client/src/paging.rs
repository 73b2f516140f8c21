//! Paged response reconciliation
//!
//! List endpoints return at most one page of results plus a `paging` member
//! describing how to fetch the next one:
//!
//! ```json
//! {
//!   "filesets": [ ... ],
//!   "paging": {
//!     "baseUrl": "/scalemgmt/v2/filesystems/gpfs0/filesets",
//!     "lastId": 1001,
//!     "fields": "filesetName,config.path",
//!     "next": "https://host:443/scalemgmt/v2/filesystems/gpfs0/filesets?lastId=1001"
//!   },
//!   "status": { "code": 200, "message": "..." }
//! }
//! ```
//!
//! The last page has no `paging` member.

use scalemgmt_core::domain::request::percent_encode;
use serde_json::{Map, Value};

const PAGING: &str = "paging";
const STATUS: &str = "status";

/// Accumulates the pages of one list response
#[derive(Debug, Default)]
pub struct PagedResult {
    merged: Map<String, Value>,
    pages: usize,
}

impl PagedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one page and return the link to the next page, if any
    ///
    /// Same-named array fields are appended after the entries already
    /// merged. `paging` and `status` always reflect the latest page and are
    /// dropped when the latest page does not carry them. A body that is not
    /// a JSON object ends the sequence without being merged.
    pub fn absorb(&mut self, page: Value) -> Option<String> {
        let Value::Object(page) = page else {
            return None;
        };
        self.pages += 1;

        let next = page.get(PAGING).and_then(next_link);

        if !page.contains_key(PAGING) {
            self.merged.remove(PAGING);
        }
        if !page.contains_key(STATUS) {
            self.merged.remove(STATUS);
        }

        for (key, value) in page {
            match value {
                Value::Array(items) if key != PAGING && key != STATUS => {
                    match self.merged.get_mut(&key) {
                        Some(Value::Array(existing)) => existing.extend(items),
                        _ => {
                            self.merged.insert(key, Value::Array(items));
                        }
                    }
                }
                value => {
                    self.merged.insert(key, value);
                }
            }
        }

        next
    }

    /// Number of pages absorbed so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.merged)
    }
}

/// Build the next page link from a `paging` member
///
/// The `baseUrl`/`lastId` cursor is preferred, with `fields` carried over so
/// later pages have the same shape; `next` is used when no cursor is given.
pub fn next_link(paging: &Value) -> Option<String> {
    let base_url = paging.get("baseUrl").and_then(Value::as_str);
    let last_id = paging.get("lastId").and_then(|id| match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    });

    if let (Some(base_url), Some(last_id)) = (base_url, last_id) {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        let mut link = format!(
            "{}{}lastId={}",
            base_url,
            separator,
            percent_encode(&last_id)
        );
        if let Some(fields) = paging.get("fields").and_then(Value::as_str) {
            link.push_str("&fields=");
            link.push_str(&percent_encode(fields));
        }
        return Some(link);
    }

    paging
        .get("next")
        .and_then(Value::as_str)
        .filter(|next| !next.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_page() {
        let mut result = PagedResult::new();
        let next = result.absorb(json!({
            "filesystems": [{"name": "gpfs0"}],
            "status": {"code": 200, "message": "ok"}
        }));
        assert_eq!(next, None);
        assert_eq!(result.pages(), 1);
        assert_eq!(result.into_value()["filesystems"][0]["name"], "gpfs0");
    }

    #[test]
    fn test_arrays_concatenate_in_arrival_order() {
        let mut result = PagedResult::new();
        let next = result.absorb(json!({
            "filesets": [{"filesetName": "a"}, {"filesetName": "b"}],
            "paging": {"baseUrl": "/scalemgmt/v2/filesystems/gpfs0/filesets", "lastId": 2},
            "status": {"code": 200, "message": "page 1"}
        }));
        assert_eq!(
            next.as_deref(),
            Some("/scalemgmt/v2/filesystems/gpfs0/filesets?lastId=2")
        );

        let next = result.absorb(json!({
            "filesets": [{"filesetName": "c"}],
            "status": {"code": 200, "message": "page 2"}
        }));
        assert_eq!(next, None);

        let merged = result.into_value();
        let names: Vec<_> = merged["filesets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["filesetName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(merged["status"]["message"], "page 2");
        assert!(merged.get("paging").is_none());
    }

    #[test]
    fn test_status_comes_from_latest_page_only() {
        let mut result = PagedResult::new();
        result.absorb(json!({
            "jobs": [1],
            "paging": {"next": "https://host/jobs?lastId=1"},
            "status": {"code": 200}
        }));
        result.absorb(json!({"jobs": [2]}));
        let merged = result.into_value();
        assert_eq!(merged["jobs"], json!([1, 2]));
        assert!(merged.get("status").is_none());
    }

    #[test]
    fn test_cursor_carries_fields() {
        let link = next_link(&json!({
            "baseUrl": "/scalemgmt/v2/filesystems/gpfs0/quotas",
            "lastId": "17",
            "fields": ":all:"
        }));
        assert_eq!(
            link.as_deref(),
            Some("/scalemgmt/v2/filesystems/gpfs0/quotas?lastId=17&fields=%3Aall%3A")
        );
    }

    #[test]
    fn test_next_link_fallback() {
        let link = next_link(&json!({"next": "https://host/filesystems?lastId=9"}));
        assert_eq!(link.as_deref(), Some("https://host/filesystems?lastId=9"));
        assert_eq!(next_link(&json!({})), None);
    }

    #[test]
    fn test_non_object_page_ends_sequence() {
        let mut result = PagedResult::new();
        assert_eq!(result.absorb(Value::Null), None);
        assert_eq!(result.pages(), 0);
    }
}
