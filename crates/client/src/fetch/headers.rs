//! Header conversion between reqwest and the cache response model.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use swcache_core::CacheMode;

/// Request headers that express a per-request cache mode on the wire.
pub fn cache_headers(mode: CacheMode) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if mode == CacheMode::NoStore {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    }
    headers
}

/// Flatten a header map into name/value pairs, skipping non-UTF-8 values.
///
/// Repeated headers keep one pair per value, in wire order.
pub fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value): (&HeaderName, &HeaderValue)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
