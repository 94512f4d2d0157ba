//! The network seam.
//!
//! [`Network::fetch`] fails only on transport problems. Any HTTP status,
//! 404 and 500 included, is a successful fetch; deciding what to do with
//! it is the controller's business.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::Error;
use crate::request::{CacheRequest, CacheResponse};

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &CacheRequest) -> Result<CacheResponse, Error>;
}

/// A scripted network that answers from a fixed table.
///
/// URLs without a route fail as if the host were unreachable. Every
/// request is recorded so callers can assert on what went out.
#[derive(Debug, Default)]
pub struct StaticNetwork {
    routes: Mutex<HashMap<String, CacheResponse>>,
    offline: Mutex<bool>,
    log: Mutex<Vec<CacheRequest>>,
}

impl StaticNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` (absolute, as resolved) with `response`.
    pub fn route(self, url: &str, response: CacheResponse) -> Self {
        self.set_route(url, response);
        self
    }

    pub fn set_route(&self, url: &str, response: CacheResponse) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(url.to_string(), response);
        }
    }

    /// Fail every request regardless of routes.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.lock() {
            *flag = offline;
        }
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<CacheRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<CacheResponse, Error> {
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }

        let offline = self.offline.lock().map(|flag| *flag).unwrap_or(false);
        if offline {
            return Err(Error::Network(format!("offline: {request}")));
        }

        self.routes
            .lock()
            .ok()
            .and_then(|routes| routes.get(request.url.as_str()).cloned())
            .ok_or_else(|| Error::Network(format!("no route to {}", request.url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_routed_response() {
        let network =
            StaticNetwork::new().route("https://example.org/ads.txt", CacheResponse::new(200, "OK", "google.com"));
        let response = network
            .fetch(&CacheRequest::get(url("https://example.org/ads.txt")))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(network.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unrouted_is_network_error() {
        let network = StaticNetwork::new();
        let result = network.fetch(&CacheRequest::get(url("https://example.org/x"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_offline_overrides_routes() {
        let network = StaticNetwork::new().route("https://example.org/", CacheResponse::new(200, "OK", "<html>"));
        network.set_offline(true);
        assert!(network.fetch(&CacheRequest::get(url("https://example.org/"))).await.is_err());
        network.set_offline(false);
        assert!(network.fetch(&CacheRequest::get(url("https://example.org/"))).await.is_ok());
    }
}
