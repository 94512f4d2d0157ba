//! Fetch interception: network first, bucket second, 503 last.

use serde::{Deserialize, Serialize};

use super::OfflineController;
use crate::origin::is_http;
use crate::request::{CacheMode, CacheRequest, CacheResponse};

/// Where an answered request got its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The synthesized 503.
    Offline,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Offline => "offline",
        }
    }
}

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs its default handling.
    Passthrough,
    Respond { response: CacheResponse, source: ResponseSource },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&CacheResponse> {
        match self {
            Self::Passthrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Self::Passthrough => None,
            Self::Respond { source, .. } => Some(*source),
        }
    }

    fn network(response: CacheResponse) -> Self {
        Self::Respond { response, source: ResponseSource::Network }
    }

    fn cached_or_offline(cached: Option<CacheResponse>) -> Self {
        match cached {
            Some(response) => Self::Respond { response, source: ResponseSource::Cache },
            None => Self::Respond { response: CacheResponse::offline(), source: ResponseSource::Offline },
        }
    }
}

/// Sub-resource responses worth keeping: exactly 200 and not an HTML URL.
fn is_storable(request: &CacheRequest, response: &CacheResponse) -> bool {
    response.status == 200 && !request.url.as_str().contains(".html")
}

impl OfflineController {
    /// Decide how to answer one outgoing request.
    ///
    /// Non-GET requests and non-http(s) URLs pass through untouched.
    /// Everything else is answered with a concrete response.
    pub async fn handle_fetch(&self, request: CacheRequest) -> FetchOutcome {
        if !request.is_get() || !is_http(&request.url) {
            tracing::trace!(%request, "passthrough");
            return FetchOutcome::Passthrough;
        }

        if request.is_navigation() {
            self.handle_navigation(request).await
        } else {
            self.handle_subresource(request).await
        }
    }

    /// Page loads always go to the network with HTTP caching disabled and
    /// are never written to the bucket.
    async fn handle_navigation(&self, request: CacheRequest) -> FetchOutcome {
        let live = request.with_cache(CacheMode::NoStore);
        match self.network.fetch(&live).await {
            Ok(response) => FetchOutcome::network(response),
            Err(e) => {
                tracing::warn!(url = %live.url, error = %e, "navigation failed, serving fallback document");
                FetchOutcome::cached_or_offline(self.fallback_document().await)
            }
        }
    }

    async fn handle_subresource(&self, request: CacheRequest) -> FetchOutcome {
        match self.network.fetch(&request).await {
            Ok(response) => {
                if is_storable(&request, &response) {
                    self.store_in_background(request, response.clone()).await;
                }
                FetchOutcome::network(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed, trying bucket");
                FetchOutcome::cached_or_offline(self.lookup(&request).await)
            }
        }
    }

    async fn fallback_document(&self) -> Option<CacheResponse> {
        match self.settings.resolve(&self.settings.fallback_document) {
            Ok(url) => self.lookup(&CacheRequest::get(url)).await,
            Err(e) => {
                tracing::warn!(error = %e, "fallback document does not resolve");
                None
            }
        }
    }

    /// Bucket lookup where a storage error counts as a miss.
    async fn lookup(&self, request: &CacheRequest) -> Option<CacheResponse> {
        match self.storage.match_entry(&self.bucket, request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "bucket lookup failed");
                None
            }
        }
    }
}
