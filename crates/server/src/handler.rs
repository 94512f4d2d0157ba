//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    AppState, CacheListParams, CachePurgeParams, SwFetchParams,
    cache::{list_impl, purge_impl},
    lifecycle::{activate_impl, install_impl, status_impl},
    sw_fetch::fetch_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    state: Arc<AppState>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { tool_router: Self::tool_router(), state }
    }

    #[tool(description = "Run the install lifecycle step: fetch every static asset and store them in the current \
                          versioned bucket. Failures are reported, never fatal.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.state).await
    }

    #[tool(description = "Run the activate lifecycle step: delete every bucket except the current version's.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    #[tool(description = "Report the controller's lifecycle state and bucket name.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.state).await
    }

    /// Intercept a request the way the offline cache would.
    ///
    /// Page loads are network-first with a cached fallback document;
    /// sub-resources are network-first with bucket fallback.
    #[tool(description = "Send a request through the offline cache. Returns status, body and whether the answer \
                          came from the network, the cache, or the offline placeholder.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache buckets, or the entries of one bucket.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.state, params.0).await
    }

    #[tool(description = "Delete a cache bucket by name.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.state, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
