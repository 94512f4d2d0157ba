//! cache_list tool implementation.
//!
//! Lists buckets, or the entries of one bucket.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;

use crate::tools::{AppState, json_result};

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Bucket to list entries of. Omit to list buckets.
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BucketSummary {
    pub name: String,
    pub entries: usize,
    /// Whether this is the bucket the running controller owns.
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: usize,
    pub stored_at: String,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Buckets { buckets: Vec<BucketSummary> },
    Entries { bucket: String, entries: Vec<EntrySummary> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(state: &AppState, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.bucket {
        None => {
            let mut buckets = Vec::new();
            for name in state.storage.keys().await? {
                let entries = state.storage.entries(&name).await?.len();
                let current = name == state.controller.bucket();
                buckets.push(BucketSummary { name, entries, current });
            }
            CacheListOutput::Buckets { buckets }
        }
        Some(bucket) => {
            if !state.storage.has(&bucket).await? {
                return Err(Error::CacheMiss(bucket).into());
            }
            let entries = state
                .storage
                .entries(&bucket)
                .await?
                .into_iter()
                .map(|e| EntrySummary {
                    content_type: e.response.header("content-type").map(str::to_string),
                    bytes: e.response.body.len(),
                    status: e.response.status,
                    method: e.method,
                    url: e.url,
                    stored_at: e.stored_at,
                })
                .collect();
            CacheListOutput::Entries { bucket, entries }
        }
    };

    json_result(&output)
}
