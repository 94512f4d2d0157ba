//! sw_install, sw_activate and sw_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::{AppState, json_result};

/// Run the install handler and report what was cached.
pub async fn install_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let report = state.controller.install().await;
    json_result(&report)
}

/// Run the activate handler and report which buckets were removed.
pub async fn activate_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let report = state.controller.activate().await;
    json_result(&report)
}

pub async fn status_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let status = state.controller.status().await;
    json_result(&status)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::*;
    use super::*;
    use swcache_core::{ActivateReport, CacheResponse, CacheStorage, ControllerState, ControllerStatus, InstallReport, StaticNetwork};

    #[tokio::test]
    async fn test_install_then_activate() {
        let network = Arc::new(StaticNetwork::new());
        for asset in swcache_core::config::DEFAULT_STATIC_ASSETS {
            network.set_route(&format!("{ORIGIN}{asset}"), CacheResponse::new(200, "OK", "x"));
        }
        let (state, storage) = state_with(network);
        storage.open("yfo-cache-v18").await.unwrap();

        let install: InstallReport = output(&install_impl(&state).await.unwrap());
        assert_eq!(install.bucket, "yfo-cache-v19");
        assert_eq!(install.cached, 6);

        let activate: ActivateReport = output(&activate_impl(&state).await.unwrap());
        assert_eq!(activate.deleted, vec!["yfo-cache-v18"]);

        let status: ControllerStatus = output(&status_impl(&state).await.unwrap());
        assert_eq!(status.state, ControllerState::Active);
        assert!(status.clients_claimed);
    }

    #[tokio::test]
    async fn test_install_offline_reports_failures() {
        let network = Arc::new(StaticNetwork::new());
        network.set_offline(true);
        let (state, _storage) = state_with(network);

        let install: InstallReport = output(&install_impl(&state).await.unwrap());
        assert_eq!(install.cached, 0);
        assert_eq!(install.failed.len(), 6);
    }
}
