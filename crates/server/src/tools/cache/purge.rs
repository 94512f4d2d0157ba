//! cache_purge tool implementation.
//!
//! Deletes one bucket outright.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;

use crate::tools::{AppState, json_result};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Name of the bucket to delete.
    pub bucket: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub bucket: String,
    /// False when no such bucket existed.
    pub deleted: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(state: &AppState, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.bucket.trim().is_empty() {
        return Err(Error::InvalidInput("bucket must be specified".to_string()).into());
    }

    let deleted = state.storage.delete(&params.bucket).await?;
    if deleted && params.bucket == state.controller.bucket() {
        tracing::warn!(bucket = %params.bucket, "purged the active bucket; offline assets are gone until reinstall");
    }

    json_result(&CachePurgeOutput { bucket: params.bucket, deleted })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::*;
    use swcache_core::{CacheStorage, StaticNetwork};

    #[tokio::test]
    async fn test_purge_existing() {
        let (state, storage) = state_with(Arc::new(StaticNetwork::new()));
        storage.open("yfo-cache-v18").await.unwrap();

        let params = CachePurgeParams { bucket: "yfo-cache-v18".into() };
        let out: CachePurgeOutput = output(&purge_impl(&state, params).await.unwrap());
        assert!(out.deleted);
        assert!(!storage.has("yfo-cache-v18").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_missing() {
        let (state, _storage) = state_with(Arc::new(StaticNetwork::new()));
        let params = CachePurgeParams { bucket: "yfo-cache-v3".into() };
        let out: CachePurgeOutput = output(&purge_impl(&state, params).await.unwrap());
        assert!(!out.deleted);
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let (state, _storage) = state_with(Arc::new(StaticNetwork::new()));
        let params = CachePurgeParams { bucket: "  ".into() };
        assert!(purge_impl(&state, params).await.is_err());
    }
}
