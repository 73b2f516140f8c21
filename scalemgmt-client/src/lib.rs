//! Scale Management HTTP Client
//!
//! A small, type-safe HTTP client for the Spectrum Scale management REST API
//! (`/scalemgmt/v2`).
//!
//! The client does two kinds of work:
//! - builds [`PreparedRequest`] values for write operations (filesets,
//!   quotas, ACLs) without sending them, so they can be queued and ordered
//!   by the job scheduler
//! - performs reads and executes prepared requests, following pagination
//!   links on list endpoints
//!
//! # Example
//!
//! ```no_run
//! use scalemgmt_client::{ConnectionSettings, ScaleClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ConnectionSettings::new("scale.example.org", "admin")
//!         .with_password("secret");
//!     let client = ScaleClient::new(&settings)?;
//!
//!     for fs in client.filesystems().await? {
//!         println!("{}", fs.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod acl;
mod filesets;
mod filesystems;
mod jobs;
pub mod models;
pub mod paging;
mod quotas;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use scalemgmt_core::domain::request::{Method, PreparedRequest};

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Certificate, Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paging::PagedResult;

/// Connection settings for a management API server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    /// API version path segment, e.g. "v2"
    pub version: String,
    #[serde(alias = "user")]
    pub username: String,
    pub password: Option<String>,
    /// Verify the server's TLS certificate
    pub verify_ssl: bool,
    /// PEM file of extra CA certificates trusted when verifying the server
    #[serde(alias = "verify_method", deserialize_with = "ca_bundle_or_flag")]
    pub ca_bundle: Option<PathBuf>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Base URL of the versioned API, e.g. `https://host:443/scalemgmt/v2`
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}/scalemgmt/{}",
            self.protocol, self.host, self.port, self.version
        )
    }
}

/// `verify_method` may hold a flag or a CA bundle path; only a path is kept
fn ca_bundle_or_flag<'de, D>(deserializer: D) -> std::result::Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BundleOrFlag {
        Path(PathBuf),
        Flag(bool),
    }

    Ok(match Option::<BundleOrFlag>::deserialize(deserializer)? {
        Some(BundleOrFlag::Path(path)) => Some(path),
        Some(BundleOrFlag::Flag(_)) | None => None,
    })
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "scaleserver.example.org".to_string(),
            port: 443,
            protocol: "https".to_string(),
            version: "v2".to_string(),
            username: "username".to_string(),
            password: None,
            verify_ssl: true,
            ca_bundle: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the management API
///
/// Endpoint helpers are organized by resource:
/// - Filesystems (list, get)
/// - Filesets (list, prepare create)
/// - Quotas (list, prepare set)
/// - ACLs (get, prepare put)
/// - Jobs (list, poll status)
#[derive(Debug, Clone)]
pub struct ScaleClient {
    /// Base URL of the versioned API (e.g. "https://host:443/scalemgmt/v2")
    base_url: String,
    /// Parsed base URL, used to resolve relative links
    base: Option<Url>,
    credentials: Option<(String, Option<String>)>,
    client: Client,
}

impl ScaleClient {
    /// Create a client from connection settings
    ///
    /// Sets JSON `accept`/`content-type` defaults, basic authentication and
    /// the TLS verification policy, trusting `ca_bundle` when one is set.
    ///
    /// # Errors
    /// Returns `CaBundle` if the bundle cannot be read or holds no
    /// certificate.
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .timeout(Duration::from_secs(settings.timeout_secs));

        if let Some(path) = &settings.ca_bundle {
            builder = builder.add_root_certificate(load_ca_bundle(path)?);
            tracing::debug!("Trusting CA bundle {}", path.display());
        }
        if !settings.verify_ssl {
            tracing::warn!("Verifying TLS connection to {} disabled", settings.host);
        }

        let client = builder.build()?;

        let mut scale = Self::with_client(settings.base_url(), client);
        scale.credentials = Some((settings.username.clone(), settings.password.clone()));
        Ok(scale)
    }

    /// Create a client around a custom reqwest client, without credentials
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).ok();
        Self {
            base_url,
            base,
            credentials: None,
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path, e.g. `endpoint("filesystems")`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Resolve a link returned by the server against the base URL
    ///
    /// Paging links are absolute paths such as `/scalemgmt/v2/filesets`, so
    /// they keep the base URL's scheme and authority.
    pub fn resolve(&self, link: &str) -> String {
        match self.base.as_ref().and_then(|base| base.join(link).ok()) {
            Some(url) => url.into(),
            None => link.to_string(),
        }
    }

    /// Send a prepared request and return the status code and decoded body
    ///
    /// Non-2xx responses are not errors here: the caller decides what a
    /// rejection means. An empty or non-JSON body decodes to `Value::Null`.
    pub async fn execute(&self, request: &PreparedRequest) -> Result<(u16, Value)> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.authorized(self.client.request(method, request.url()));
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body);
        }

        tracing::debug!("Sending {}", request);
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::transport(request.url(), e))?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        Ok((status, body))
    }

    /// GET a URL and deserialize the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| ClientError::transport(url, e))?;
        self.handle_response(response).await
    }

    /// GET a list endpoint, following pagination until the last page
    ///
    /// Array fields are concatenated across pages in arrival order; the
    /// `paging` and `status` members come from the last page fetched.
    pub async fn get_all(&self, url: &str) -> Result<Value> {
        let mut merged = PagedResult::new();
        let mut seen = HashSet::new();
        let mut next = Some(url.to_string());

        while let Some(url) = next.take() {
            if !seen.insert(url.clone()) {
                tracing::warn!("Pagination returned an already fetched page: {}", url);
                break;
            }
            let page: Value = self.get_json(&url).await?;
            next = merged.absorb(page).map(|link| self.resolve(&link));
        }

        tracing::debug!("Merged {} page(s) from {}", merged.pages(), url);
        Ok(merged.into_value())
    }

    /// Returns the response from the info endpoint
    pub async fn info(&self) -> Result<Value> {
        self.get_json(&self.endpoint("info")).await
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::refused(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(format!("not JSON: {}", e)))
    }
}

/// Deserialize the array stored under `field` of a merged list response
///
/// A missing field means the list is empty.
pub(crate) fn extract_list<T: DeserializeOwned>(mut merged: Value, field: &str) -> Result<Vec<T>> {
    let list = merged
        .get_mut(field)
        .map(Value::take)
        .unwrap_or_else(|| Value::Array(Vec::new()));

    serde_json::from_value(list)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid {} list: {}", field, e)))
}

const PEM_CERTIFICATE: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// Read a PEM bundle of CA certificates
fn load_ca_bundle(path: &Path) -> Result<Certificate> {
    let fail = |reason: String| ClientError::CaBundle {
        path: path.to_path_buf(),
        reason,
    };

    let pem = std::fs::read(path).map_err(|e| fail(e.to_string()))?;
    if !pem
        .windows(PEM_CERTIFICATE.len())
        .any(|window| window == PEM_CERTIFICATE)
    {
        return Err(fail("no PEM certificate found".to_string()));
    }
    Certificate::from_pem(&pem).map_err(|e| fail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ScaleClient {
        ScaleClient::with_client("https://scale.example.org:443/scalemgmt/v2/", Client::new())
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        assert_eq!(client().base_url(), "https://scale.example.org:443/scalemgmt/v2");
    }

    #[test]
    fn test_base_url_from_settings() {
        let settings = ConnectionSettings::new("gpfs-gui01", "admin");
        assert_eq!(settings.base_url(), "https://gpfs-gui01:443/scalemgmt/v2");
    }

    #[test]
    fn test_client_from_settings() {
        let settings = ConnectionSettings::new("gpfs-gui01", "admin").with_password("pw");
        let client = ScaleClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "https://gpfs-gui01:443/scalemgmt/v2");
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client().endpoint("/filesystems"),
            "https://scale.example.org:443/scalemgmt/v2/filesystems"
        );
    }

    #[test]
    fn test_resolve_relative_link() {
        let client = client();
        assert_eq!(
            client.resolve("/scalemgmt/v2/filesystems?lastId=4"),
            "https://scale.example.org/scalemgmt/v2/filesystems?lastId=4"
        );
        assert_eq!(client.resolve("https://other/x"), "https://other/x");
    }

    #[test]
    fn test_resolve_without_parsable_base() {
        let client = ScaleClient::with_client("not a url", Client::new());
        assert_eq!(client.resolve("/jobs?lastId=2"), "/jobs?lastId=2");
    }

    #[test]
    fn test_settings_accept_legacy_keys() {
        let settings: ConnectionSettings = serde_json::from_value(serde_json::json!({
            "host": "gpfs-gui01",
            "user": "admin",
            "verify_method": "/etc/pki/scale-ca.pem",
            "verify_warnings": false
        }))
        .unwrap();
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.ca_bundle, Some(PathBuf::from("/etc/pki/scale-ca.pem")));

        let settings: ConnectionSettings =
            serde_json::from_value(serde_json::json!({"verify_method": true})).unwrap();
        assert_eq!(settings.ca_bundle, None);
    }

    fn settings_with_bundle(path: PathBuf) -> ConnectionSettings {
        ConnectionSettings {
            ca_bundle: Some(path),
            ..ConnectionSettings::new("gpfs-gui01", "admin")
        }
    }

    #[test]
    fn test_missing_ca_bundle() {
        let path = std::env::temp_dir().join("scalemgmt-missing-ca-bundle.pem");
        match ScaleClient::new(&settings_with_bundle(path.clone())) {
            Err(ClientError::CaBundle { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a CA bundle error, got {:?}", other),
        }
    }

    #[test]
    fn test_ca_bundle_without_certificate() {
        let path = std::env::temp_dir().join(format!("scalemgmt-ca-{}.pem", std::process::id()));
        std::fs::write(&path, "not a certificate\n").unwrap();

        let result = ScaleClient::new(&settings_with_bundle(path.clone()));
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, ClientError::CaBundle { .. }));
        assert!(err.to_string().contains("no PEM certificate found"));
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
