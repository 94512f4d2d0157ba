//! Live network access for the offline cache controller.
//!
//! ### Requests
//! - Method and URL are taken from the intercepted request as-is
//! - `CacheMode::NoStore` becomes `Cache-Control: no-store` + `Pragma: no-cache`
//! - Max redirects: 5
//!
//! ### Responses
//! - Any HTTP status is returned; only transport failures are errors
//! - Max body bytes: 10MB (configurable)

pub mod headers;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use swcache_core::{AppConfig, CacheRequest, CacheResponse, Error, Network};

pub use headers::{cache_headers, header_pairs};

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new HTTP network with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<CacheResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("bad method {:?}: {}", request.method, e)))?;

        let response = self
            .http
            .request(method, request.url.clone())
            .headers(cache_headers(request.cache))
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {}", request.url, e)))?;

        let status = response.status();

        if let Some(len) = response.content_length() {
            let len = usize::try_from(len).unwrap_or(usize::MAX);
            if len > self.config.max_bytes {
                return Err(self.too_large(len));
            }
        }

        let final_url = response.url().clone();
        let headers = header_pairs(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        tracing::debug!(
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(CacheResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            url: Some(final_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "yfo-site/2".into(), timeout_ms: 1_500, max_bytes: 42, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "yfo-site/2");
        assert_eq!(config.timeout, Duration::from_millis(1_500));
        assert_eq!(config.max_bytes, 42);
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_http_network_new() {
        assert!(HttpNetwork::new(FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_bad_method_is_invalid_input() {
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let request = CacheRequest::get(Url::parse("http://127.0.0.1:9/").unwrap()).with_method("BAD METHOD");
        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let config = FetchConfig { timeout: Duration::from_millis(500), ..Default::default() };
        let network = HttpNetwork::new(config).unwrap();
        let request = CacheRequest::get(Url::parse("http://127.0.0.1:9/ads.txt").unwrap());
        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
