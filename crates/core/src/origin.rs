//! Request URL resolution against the site origin.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a site origin such as `https://example.org`.
///
/// Only http(s) origins are accepted; any path, query or fragment is dropped.
pub fn parse_origin(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Resolve a request URL against the origin.
///
/// Root-relative paths (`/ads.txt`) join onto the origin, absolute URLs are
/// kept as-is whatever their scheme. The fragment is always removed; the
/// query string is left untouched. Scheme filtering is the caller's job.
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Whether the URL uses a scheme the offline cache is allowed to intercept.
pub fn is_http(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
