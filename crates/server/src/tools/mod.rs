//! MCP tool implementations.
//!
//! Lifecycle tools drive the offline cache controller the way a browser
//! drives a service worker; cache tools inspect and prune buckets.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_core::{CacheStorage, Error, Network, OfflineController};

pub use cache::{CacheListParams, CachePurgeParams};
pub use sw_fetch::{SwFetchOutput, SwFetchParams};

/// Everything a tool call may touch.
pub struct AppState {
    pub controller: OfflineController,
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
}

impl AppState {
    pub fn new(controller: OfflineController, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self { controller, storage, network }
    }
}

/// Serialize a tool output as pretty JSON text content.
pub fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use swcache_core::{AppConfig, ControllerSettings, MemoryStorage, StaticNetwork};

    pub const ORIGIN: &str = "https://youth.example.org";

    pub fn state_with(network: Arc<StaticNetwork>) -> (AppState, Arc<MemoryStorage>) {
        let config = AppConfig { origin: ORIGIN.into(), ..Default::default() };
        let settings = ControllerSettings::from_config(&config).unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let controller = OfflineController::new(
            settings,
            Arc::clone(&storage) as Arc<dyn CacheStorage>,
            Arc::clone(&network) as Arc<dyn Network>,
        );
        let state = AppState::new(controller, Arc::clone(&storage) as Arc<dyn CacheStorage>, network);
        (state, storage)
    }

    /// Pull the JSON text out of a tool result.
    pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
