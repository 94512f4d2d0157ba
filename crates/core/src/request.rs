//! Intercepted request and cached response types.
//!
//! These mirror the parts of the browser Fetch model the offline cache
//! actually looks at: method, URL, request mode, destination and the
//! per-request cache mode.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Status text of the synthesized offline response.
pub const OFFLINE_STATUS_TEXT: &str = "Service Unavailable";

/// Body of the synthesized offline response.
pub const OFFLINE_BODY: &str = "Offline";

/// How the request was initiated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(Self::Navigate),
            "same-origin" => Ok(Self::SameOrigin),
            "no-cors" | "" => Ok(Self::NoCors),
            "cors" => Ok(Self::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// What the response will be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// Anything else, including the empty destination of `fetch()` calls.
    #[default]
    Other,
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "image" => Ok(Self::Image),
            "font" => Ok(Self::Font),
            "manifest" => Ok(Self::Manifest),
            "" | "other" => Ok(Self::Other),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// Per-request HTTP cache directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass every intermediate HTTP cache and do not store the result.
    NoStore,
}

/// An outgoing request seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRequest {
    pub method: String,
    pub url: Url,
    #[serde(default)]
    pub mode: RequestMode,
    #[serde(default)]
    pub destination: Destination,
    #[serde(default)]
    pub cache: CacheMode,
}

impl CacheRequest {
    /// A plain sub-resource `GET`.
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".into(),
            url,
            mode: RequestMode::NoCors,
            destination: Destination::Other,
            cache: CacheMode::Default,
        }
    }

    /// A top-level document load.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, destination: Destination::Document, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    /// Methods compare case-insensitively, as the Fetch standard normalizes them.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate || self.destination == Destination::Document
    }
}

impl fmt::Display for CacheRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response as returned by the network or stored in a bucket.
///
/// The body is reference counted, so cloning is how a response is
/// duplicated before one copy goes to the bucket and the other to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Final URL after redirects, when known.
    #[serde(default)]
    pub url: Option<Url>,
}

impl CacheResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into(), url: None }
    }

    /// The placeholder returned when neither network nor bucket can answer.
    pub fn offline() -> Self {
        Self::new(503, OFFLINE_STATUS_TEXT, OFFLINE_BODY)
            .with_header("content-type", "text/plain")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup; the first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
