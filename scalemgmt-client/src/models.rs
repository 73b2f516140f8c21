//! Request and response models for the management API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filesystem entry of `GET /filesystems`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemSummary {
    pub name: String,
    #[serde(default)]
    pub oid: Option<u64>,
}

/// Fileset entry of `GET /filesystems/{fs}/filesets`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesetSummary {
    pub fileset_name: String,
    #[serde(default)]
    pub filesystem_name: Option<String>,
    /// Only present when all fields are requested
    #[serde(default)]
    pub config: Option<FilesetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesetConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub inode_space: Option<Value>,
}

/// Parameters for creating a fileset
#[derive(Debug, Clone)]
pub struct NewFileset {
    pub filesystem: String,
    pub fileset: String,
    /// Junction path in the filesystem
    pub path: String,
    pub owner: String,
    pub group: String,
    /// Octal permission string, e.g. "0750"
    pub permissions: String,
    pub permission_change_mode: String,
    /// Inode space to create the fileset in ("new" for an independent fileset)
    pub inode_space: String,
    pub comment: Option<String>,
}

impl NewFileset {
    pub fn new(
        filesystem: impl Into<String>,
        fileset: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            filesystem: filesystem.into(),
            fileset: fileset.into(),
            path: path.into(),
            owner: "root".to_string(),
            group: "root".to_string(),
            permissions: "0750".to_string(),
            permission_change_mode: "chmodAndUpdateAcl".to_string(),
            inode_space: "new".to_string(),
            comment: None,
        }
    }
}

/// Quota limits for a fileset, user or group
///
/// Unset limits are left out of the request so the server keeps its current
/// values for them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimits {
    #[serde(skip)]
    pub filesystem: String,
    /// Fileset, user or group the quota applies to
    pub object_name: String,
    /// "FILESET", "USR" or "GRP"
    pub quota_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_soft_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hard_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_grace_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_soft_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_hard_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_grace_period: Option<String>,
}

impl QuotaLimits {
    pub fn fileset(filesystem: impl Into<String>, fileset: impl Into<String>) -> Self {
        Self {
            filesystem: filesystem.into(),
            object_name: fileset.into(),
            quota_type: "FILESET".to_string(),
            block_soft_limit: None,
            block_hard_limit: None,
            block_grace_period: None,
            files_soft_limit: None,
            files_hard_limit: None,
            files_grace_period: None,
        }
    }

    pub fn blocks(mut self, soft: &str, hard: &str, grace: &str) -> Self {
        self.block_soft_limit = Some(soft.to_string());
        self.block_hard_limit = Some(hard.to_string());
        self.block_grace_period = Some(grace.to_string());
        self
    }

    pub fn files(mut self, soft: &str, hard: &str, grace: &str) -> Self {
        self.files_soft_limit = Some(soft.to_string());
        self.files_hard_limit = Some(hard.to_string());
        self.files_grace_period = Some(grace.to_string());
        self
    }
}

/// One NFSv4 access control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// "allow" or "deny"
    #[serde(rename = "type")]
    pub kind: String,
    /// e.g. "special:owner@" or "group:apps-team"
    pub who: String,
    pub permissions: String,
    /// Inheritance flags, e.g. "fdi"
    #[serde(default)]
    pub flags: String,
}

impl AclEntry {
    pub fn allow(who: &str, permissions: &str, flags: &str) -> Self {
        Self {
            kind: "allow".to_string(),
            who: who.to_string(),
            permissions: permissions.to_string(),
            flags: flags.to_string(),
        }
    }
}

/// ACL of a path, as returned by `GET /filesystems/{fs}/acl/{path}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Acl {
    /// "NFSv4" or "POSIX"
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub entries: Vec<AclEntry>,
}

/// Quota entry of `GET /filesystems/{fs}[/filesets/{fileset}]/quotas`
///
/// Block values are in KiB.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuotaEntry {
    pub object_name: Option<String>,
    pub quota_type: Option<String>,
    pub block_usage: Option<u64>,
    pub block_quota: Option<u64>,
    pub block_limit: Option<u64>,
    pub files_usage: Option<u64>,
    pub files_quota: Option<u64>,
    pub files_limit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quota_entry_from_listing() {
        let entry: QuotaEntry = serde_json::from_value(json!({
            "objectName": "projects",
            "quotaType": "FILESET",
            "blockUsage": 512,
            "blockQuota": 10485760,
            "blockLimit": 11534336,
            "filesUsage": 3,
            "isDefaultQuota": false
        }))
        .unwrap();

        assert_eq!(entry.object_name.as_deref(), Some("projects"));
        assert_eq!(entry.block_limit, Some(11534336));
        assert_eq!(entry.files_quota, None);
    }

    #[test]
    fn test_acl_from_response() {
        let acl: Acl = serde_json::from_value(json!({
            "type": "NFSv4",
            "entries": [
                {"type": "allow", "who": "special:owner@", "permissions": "rwmxDaAnNcCos", "flags": ""},
                {"type": "allow", "who": "group:apps-team", "permissions": "rxancs"}
            ]
        }))
        .unwrap();

        assert_eq!(acl.kind.as_deref(), Some("NFSv4"));
        assert_eq!(acl.entries[1], AclEntry::allow("group:apps-team", "rxancs", ""));
    }
}
