//! Offline asset cache controller.
//!
//! One controller instance owns one versioned bucket and reacts to three
//! host events:
//!
//! - install: pre-populate the bucket with the static asset list
//! - activate: delete every bucket of another version
//! - fetch: network-first answering of intercepted requests
//!
//! No handler ever returns an error to the requesting page. Failures are
//! logged and degrade to a cached entry or the synthesized 503 response.

mod intercept;
mod lifecycle;
mod state;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::{BucketName, CacheStorage};
use crate::config::AppConfig;
use crate::network::Network;
use crate::origin::{parse_origin, resolve};
use crate::request::{CacheRequest, CacheResponse};

pub use intercept::{FetchOutcome, ResponseSource};
pub use lifecycle::{ActivateReport, AssetFailure, InstallReport};
pub use state::{ControllerState, ControllerStatus};

use state::Lifecycle;

/// Static inputs of a controller: where it lives and what it guarantees offline.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub origin: Url,
    pub bucket: BucketName,
    pub static_assets: Vec<String>,
    pub fallback_document: String,
}

impl ControllerSettings {
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for a bad origin and `Error::InvalidBucket`
    /// for an unusable prefix/version pair.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let bucket = BucketName::new(&config.cache_prefix, config.cache_version)?;
        Ok(Self {
            origin,
            bucket,
            static_assets: config.static_assets.clone(),
            fallback_document: config.fallback_document.clone(),
        })
    }

    /// Resolve a path or URL against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.origin, input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
    }
}

/// The offline cache controller.
pub struct OfflineController {
    settings: ControllerSettings,
    bucket: String,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    lifecycle: Mutex<Lifecycle>,
    pending: Mutex<JoinSet<()>>,
}

impl OfflineController {
    pub fn new(settings: ControllerSettings, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        let bucket = settings.bucket.to_string();
        Self {
            settings,
            bucket,
            storage,
            network,
            lifecycle: Mutex::new(Lifecycle::default()),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Name of the bucket this controller owns.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn status(&self) -> ControllerStatus {
        let lifecycle = self.lifecycle.lock().await;
        ControllerStatus {
            state: lifecycle.state,
            bucket: self.bucket.clone(),
            skip_waiting: lifecycle.skip_waiting,
            clients_claimed: lifecycle.clients_claimed,
        }
    }

    /// Wait for every background bucket write started so far.
    ///
    /// Hosts call this before shutting the controller down.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "background cache write aborted");
            }
        }
    }

    /// Write a response into the bucket without holding up the caller.
    async fn store_in_background(&self, request: CacheRequest, response: CacheResponse) {
        let storage = Arc::clone(&self.storage);
        let bucket = self.bucket.clone();

        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            match storage.put(&bucket, &request, &response).await {
                Ok(()) => tracing::debug!(%bucket, url = %request.url, "stored response"),
                Err(e) => tracing::warn!(%bucket, url = %request.url, error = %e, "cache write failed"),
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::network::StaticNetwork;

    pub const ORIGIN: &str = "https://youth.example.org";

    pub fn settings(version: u32) -> ControllerSettings {
        let config = AppConfig { origin: ORIGIN.into(), cache_version: version, ..Default::default() };
        ControllerSettings::from_config(&config).unwrap()
    }

    pub fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    pub struct Harness {
        pub storage: Arc<MemoryStorage>,
        pub network: Arc<StaticNetwork>,
        pub controller: OfflineController,
    }

    pub fn harness(version: u32) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(StaticNetwork::new());
        let controller = OfflineController::new(
            settings(version),
            Arc::clone(&storage) as Arc<dyn CacheStorage>,
            Arc::clone(&network) as Arc<dyn Network>,
        );
        Harness { storage, network, controller }
    }

    /// Route every default static asset to a 200 response.
    pub fn route_static_assets(network: &StaticNetwork) {
        for asset in crate::config::DEFAULT_STATIC_ASSETS {
            network.set_route(url(asset).as_str(), CacheResponse::new(200, "OK", format!("asset {asset}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let settings = settings(19);
        assert_eq!(settings.bucket.to_string(), "yfo-cache-v19");
        assert_eq!(settings.origin.as_str(), "https://youth.example.org/");
        assert_eq!(settings.fallback_document, "/index.html");
        assert_eq!(settings.resolve("/ads.txt").unwrap(), url("/ads.txt"));
    }

    #[test]
    fn test_settings_rejects_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(ControllerSettings::from_config(&config), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_initial_status() {
        let h = harness(19);
        let status = h.controller.status().await;
        assert_eq!(status.state, ControllerState::Parsed);
        assert_eq!(status.bucket, "yfo-cache-v19");
        assert!(!status.skip_waiting);
        assert!(!status.clients_claimed);
    }

    #[tokio::test]
    async fn test_settle_with_nothing_pending() {
        let h = harness(19);
        h.controller.settle().await;
    }
}
