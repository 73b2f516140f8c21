//! Prepared request domain type
//!
//! A prepared request is a fully formed HTTP request that has not been sent
//! yet. Requests are normalized when they are built so that two requests
//! describing the same operation compare equal, which is what the scheduler
//! relies on to avoid queuing the same mutation twice.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// HTTP method of a prepared request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, normalized HTTP request description
///
/// Equality is structural over the normalized method, URL, headers and body:
/// - the URL is parsed and re-serialized, so scheme and host case, default
///   ports and `.` segments do not matter, and a trailing `/` is dropped
/// - header names are lower-cased and kept sorted, values are trimmed
/// - the body is a JSON value, so object key order does not matter
///
/// The serialized form (`{method, url, headers, body}`) is the plain
/// structural snapshot used for display and for dry-run outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RequestParts")]
pub struct PreparedRequest {
    method: Method,
    url: String,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
}

/// Un-normalized wire form, normalized on the way in
#[derive(Deserialize)]
struct RequestParts {
    method: Method,
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
}

impl From<RequestParts> for PreparedRequest {
    fn from(parts: RequestParts) -> Self {
        let mut request = PreparedRequest::new(parts.method, &parts.url);
        for (name, value) in parts.headers {
            request = request.header(&name, &value);
        }
        match parts.body {
            Some(body) => request.json(body),
            None => request,
        }
    }
}

impl PreparedRequest {
    /// Create a request with no headers and no body
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: normalize_url(url),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: &str) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Add (or replace) a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        self
    }

    /// Attach a JSON body
    ///
    /// Also sets `content-type: application/json` so that the header set of
    /// two requests with equal bodies is equal as well.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self.header("content-type", "application/json")
    }

    /// Append query parameters to the URL, in the order given
    pub fn query(mut self, params: &[(&str, &str)]) -> Self {
        if params.is_empty() {
            return self;
        }
        let encoded: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect();
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url = format!("{}{}{}", self.url, separator, encoded.join("&"));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Canonical encoding of the body (compact JSON, sorted object keys)
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        self.body.as_ref().map(|body| body.to_string().into_bytes())
    }

    /// The structural snapshot of this request as a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "method": self.method.as_str(),
            "url": self.url,
            "headers": self.headers,
            "body": self.body,
        })
    }
}

impl std::fmt::Display for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Parse and re-serialize an absolute URL, then drop a trailing `/`
///
/// Parsing lower-cases the scheme and host, removes the scheme's default
/// port and resolves `.` and `..` path segments. Input that is not an
/// absolute URL is only trimmed.
fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    url.into()
}

/// Everything outside the RFC 3986 unreserved set
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode everything outside the RFC 3986 unreserved set
///
/// No character is treated as safe, so `/` becomes `%2F`. The management
/// API expects filesystem paths embedded in a single path segment this way.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}
