//! sw_fetch tool implementation.
//!
//! Feeds one request through the controller's fetch handler, as if a page
//! had issued it, and reports how it was answered.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheRequest, CacheResponse, Destination, FetchOutcome, RequestMode};

use super::{AppState, json_result};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Request URL; root-relative paths resolve against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default)]
    pub mode: String,

    /// Request destination: "document", "script", "style", "image", "font",
    /// "manifest" or empty (default).
    #[serde(default)]
    pub destination: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// False when the controller let the request through untouched.
    pub intercepted: bool,
    /// "network", "cache" or "offline"; "passthrough" when not intercepted.
    pub source: String,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

impl SwFetchOutput {
    fn new(url: String, intercepted: bool, source: &str, response: &CacheResponse) -> Self {
        Self {
            url,
            intercepted,
            source: source.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            content_type: response.header("content-type").map(str::to_string),
            body: String::from_utf8_lossy(&response.body).to_string(),
            body_bytes: response.body.len(),
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(state: &AppState, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = state.controller.settings().resolve(&params.url)?;
    let mode: RequestMode = params.mode.parse()?;
    let destination: Destination = params.destination.parse()?;

    let request = CacheRequest::get(url)
        .with_method(params.method)
        .with_mode(mode)
        .with_destination(destination);
    let resolved = request.url.to_string();

    let output = match state.controller.handle_fetch(request.clone()).await {
        FetchOutcome::Respond { response, source } => SwFetchOutput::new(resolved, true, source.as_str(), &response),
        FetchOutcome::Passthrough => {
            tracing::debug!(%request, "not intercepted, fetching directly");
            let response = state.network.fetch(&request).await?;
            SwFetchOutput::new(resolved, false, "passthrough", &response)
        }
    };

    json_result(&output)
}
