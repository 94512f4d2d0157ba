//! Install and activate handlers.

use serde::{Deserialize, Serialize};

use super::OfflineController;
use super::state::ControllerState;
use crate::request::{CacheRequest, RequestMode};

/// A static asset that could not be fetched at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub asset: String,
    pub reason: String,
}

/// Outcome of an install run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub bucket: String,
    /// Number of static assets written to the bucket.
    pub cached: usize,
    pub failed: Vec<AssetFailure>,
    /// Set when every asset loaded but the batch write itself failed.
    pub store_error: Option<String>,
}

impl InstallReport {
    pub fn complete(&self) -> bool {
        self.failed.is_empty() && self.store_error.is_none()
    }
}

/// Outcome of an activation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    /// The bucket left standing.
    pub bucket: String,
    /// Stale buckets removed, in enumeration order.
    pub deleted: Vec<String>,
}

impl OfflineController {
    /// Install: fetch every static asset and store them as one batch.
    ///
    /// The batch is all or nothing. If any asset fails (transport error or
    /// a non-2xx status) nothing from this run is written; the failure is
    /// logged and install still completes. Re-running for the same version
    /// overwrites the same keys.
    pub async fn install(&self) -> InstallReport {
        self.lifecycle.lock().await.advance(ControllerState::Installing);
        tracing::info!(bucket = %self.bucket, assets = self.settings.static_assets.len(), "installing");

        let mut report =
            InstallReport { bucket: self.bucket.clone(), cached: 0, failed: Vec::new(), store_error: None };

        if let Err(e) = self.storage.open(&self.bucket).await {
            tracing::error!(bucket = %self.bucket, error = %e, "failed to open bucket during install");
        }

        let mut batch = Vec::with_capacity(self.settings.static_assets.len());
        for asset in &self.settings.static_assets {
            let url = match self.settings.resolve(asset) {
                Ok(url) => url,
                Err(e) => {
                    report.failed.push(AssetFailure { asset: asset.clone(), reason: e.to_string() });
                    continue;
                }
            };

            let request = CacheRequest::get(url).with_mode(RequestMode::Cors);
            match self.network.fetch(&request).await {
                Ok(response) if response.ok() => batch.push((request, response)),
                Ok(response) => report.failed.push(AssetFailure {
                    asset: asset.clone(),
                    reason: format!("status {}", response.status),
                }),
                Err(e) => report.failed.push(AssetFailure { asset: asset.clone(), reason: e.to_string() }),
            }
        }

        if !report.failed.is_empty() {
            tracing::error!(
                bucket = %self.bucket,
                failed = ?report.failed,
                "failed to cache static assets during install"
            );
        } else {
            let count = batch.len();
            match self.storage.put_all(&self.bucket, batch).await {
                Ok(()) => report.cached = count,
                Err(e) => {
                    tracing::error!(bucket = %self.bucket, error = %e, "failed to store static assets");
                    report.store_error = Some(e.to_string());
                }
            }
        }

        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.skip_waiting = true;
        lifecycle.advance(ControllerState::Installed);
        tracing::info!(bucket = %self.bucket, cached = report.cached, "installed");

        report
    }

    /// Activate: delete every bucket but the current one, then claim clients.
    pub async fn activate(&self) -> ActivateReport {
        self.lifecycle.lock().await.advance(ControllerState::Activating);

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!(error = %e, "failed to enumerate buckets during activate");
                Vec::new()
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|name| *name != self.bucket) {
            match self.storage.delete(&name).await {
                Ok(true) => {
                    tracing::info!(bucket = %name, "deleted stale bucket");
                    deleted.push(name);
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(bucket = %name, error = %e, "failed to delete stale bucket"),
            }
        }

        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.clients_claimed = true;
        lifecycle.advance(ControllerState::Active);
        tracing::info!(bucket = %self.bucket, deleted = deleted.len(), "activated");

        ActivateReport { bucket: self.bucket.clone(), deleted }
    }

    /// Mark this controller as replaced by a newer version.
    pub async fn mark_redundant(&self) {
        self.lifecycle.lock().await.advance(ControllerState::Redundant);
        tracing::info!(bucket = %self.bucket, "controller redundant");
    }
}
