//! Configuration validation rules.
//!
//! Checks `AppConfig` values after they have been loaded from environment,
//! files, or defaults.

use crate::config::AppConfig;
use crate::origin::parse_origin;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty origin and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `cache_prefix` is empty or contains whitespace, or `cache_version` is 0
    /// - a static asset or the fallback document is not root-relative
    /// - `timeout_ms` is below 100ms or above 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.origin.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "origin".into(),
                hint: "Set SWCACHE_ORIGIN to the site origin, e.g. https://example.org".into(),
            });
        }
        parse_origin(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;

        self.bucket_name()?;

        if let Some(asset) = self.static_assets.iter().find(|a| !a.starts_with('/')) {
            return Err(invalid("static_assets", format!("{asset:?} must start with '/'")));
        }
        if !self.fallback_document.starts_with('/') {
            return Err(invalid("fallback_document", "must start with '/'"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.static_assets.is_empty() {
            tracing::warn!("static_assets is empty; nothing is guaranteed offline");
        }

        Ok(())
    }
}
