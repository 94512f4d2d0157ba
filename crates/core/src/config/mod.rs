//! Application configuration with layered loading.
//!
//! Configuration is assembled with figment from, in rising precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Environment variables (SWCACHE_*)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

use crate::cache::BucketName;

/// Assets every deployment guarantees offline.
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
    "/manifest.webmanifest",
    "/assets/generated/yfo-logo.dim_512x512.png",
    "/assets/generated/youth-hero.dim_1600x900.png",
    "/assets/generated/yfo-pwa-icon.dim_192x192.png",
    "/assets/generated/yfo-pwa-icon.dim_512x512.png",
    "/ads.txt",
];

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site origin that root-relative asset paths resolve against.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Bucket name prefix, rendered as `<prefix>-v<version>`.
    ///
    /// Set via SWCACHE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployment version. Bump on every release to retire the old bucket.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: u32,

    /// Root-relative URLs pre-populated at install time, in order.
    ///
    /// Set via SWCACHE_STATIC_ASSETS (e.g. `["/ads.txt", "/icon.png"]`).
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Bucket entry served when a page load fails offline.
    ///
    /// Set via SWCACHE_FALLBACK_DOCUMENT environment variable.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    /// Path to SQLite bucket database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    ///
    /// Set via SWCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_prefix() -> String {
    "yfo-cache".into()
}

fn default_cache_version() -> u32 {
    19
}

fn default_static_assets() -> Vec<String> {
    DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_fallback_document() -> String {
    "/index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            static_assets: default_static_assets(),
            fallback_document: default_fallback_document(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the bucket this deployment owns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the prefix or version is unusable.
    pub fn bucket_name(&self) -> Result<BucketName, ConfigError> {
        BucketName::new(&self.cache_prefix, self.cache_version)
            .map_err(|e| ConfigError::Invalid { field: "cache_prefix".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.dedupe_static_assets();
        config.validate()?;

        Ok(config)
    }

    /// Drop repeated static assets, keeping first occurrences in order.
    pub fn dedupe_static_assets(&mut self) {
        let before = self.static_assets.len();
        let mut seen = std::collections::HashSet::new();
        self.static_assets.retain(|asset| seen.insert(asset.clone()));

        let dropped = before - self.static_assets.len();
        if dropped > 0 {
            tracing::warn!(dropped, "duplicate static_assets entries ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://localhost:8080");
        assert_eq!(config.cache_prefix, "yfo-cache");
        assert_eq!(config.cache_version, 19);
        assert_eq!(config.static_assets.len(), 6);
        assert_eq!(config.static_assets[0], "/manifest.webmanifest");
        assert_eq!(config.static_assets[5], "/ads.txt");
        assert_eq!(config.fallback_document, "/index.html");
        assert_eq!(config.db_path, PathBuf::from("./swcache.sqlite"));
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.max_bytes, 10_485_760);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_bucket_name() {
        let config = AppConfig { cache_version: 20, ..Default::default() };
        assert_eq!(config.bucket_name().unwrap().to_string(), "yfo-cache-v20");
    }

    #[test]
    fn test_bucket_name_invalid() {
        let config = AppConfig { cache_version: 0, ..Default::default() };
        assert!(matches!(config.bucket_name(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_dedupe_static_assets() {
        let mut config = AppConfig {
            static_assets: vec!["/ads.txt".into(), "/icon.png".into(), "/ads.txt".into()],
            ..Default::default()
        };
        config.dedupe_static_assets();
        assert_eq!(config.static_assets, vec!["/ads.txt".to_string(), "/icon.png".to_string()]);
    }
}
