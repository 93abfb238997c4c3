//! URL resolution for manifest entries and host-supplied request URLs.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("not root-relative: {0}")]
    NotRootRelative(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a root-relative manifest path against the application origin.
///
/// The path is joined verbatim: query strings and fragments survive so the
/// stored identity is exactly what the manifest lists.
pub fn resolve_manifest_path(origin: &Url, path: &str) -> Result<Url, UrlError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    if !trimmed.starts_with('/') || trimmed.starts_with("//") {
        return Err(UrlError::NotRootRelative(trimmed.to_string()));
    }

    let resolved = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    ensure_http(&resolved)?;
    Ok(resolved)
}

/// Parse an absolute URL handed over by the host.
///
/// Unlike a canonicalizer this keeps the fragment and does not guess a
/// scheme; identity is whatever the host asked for.
pub fn parse_absolute(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    let parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    ensure_http(&parsed)?;
    Ok(parsed)
}

fn ensure_http(url: &Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}
