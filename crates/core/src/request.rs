//! Request identity and response snapshots.
//!
//! A `RequestIdentity` is the de-facto cache key: method plus the URL exactly
//! as received. Query strings and fragments are part of the identity.

use bytes::Bytes;
use std::fmt;
use url::Url;

use crate::Error;

/// The `(method, url)` pair that addresses a cached entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    method: String,
    url: Url,
}

impl RequestIdentity {
    /// Build an identity from a method and an already parsed URL.
    pub fn new(method: impl AsRef<str>, url: Url) -> Self {
        Self { method: method.as_ref().trim().to_ascii_uppercase(), url }
    }

    /// Shorthand for a GET identity.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Parse an absolute http(s) URL into an identity.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the input is empty, unparseable, or not http(s).
    pub fn parse(method: &str, url: &str) -> Result<Self, Error> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUrl("empty URL".into()));
        }
        let parsed = Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self::new(method, parsed)),
            scheme => Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Only GET identities are eligible for caching.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Serialized origin (`scheme://host[:port]`).
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An immutable capture of a network or stored response.
///
/// Cloning shares the body buffer; neither side can mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
    /// RFC 3339 timestamp of capture.
    pub captured_at: String,
}

impl ResponseSnapshot {
    /// Capture a response now.
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers, body: body.into(), captured_at: chrono::Utc::now().to_rfc3339() }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
