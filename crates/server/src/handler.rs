//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    RegionKeysParams, RegionTrimParams, RelayFetchParams,
    regions::{keys_impl, list_impl, trim_impl},
    relay_fetch::relay_impl,
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
use waypost_client::Interceptor;
use waypost_core::AppConfig;

/// The main MCP server handler for waypost.
#[derive(Clone)]
pub struct WaypostServer {
    tool_router: ToolRouter<Self>,
    interceptor: Arc<Interceptor>,
    config: Arc<AppConfig>,
}

#[tool_router]
impl WaypostServer {
    /// Create a new server handler over an installed interceptor.
    pub fn new(interceptor: Arc<Interceptor>, config: Arc<AppConfig>) -> Self {
        Self { tool_router: Self::tool_router(), interceptor, config }
    }

    /// Run one request through the interception layer.
    #[tool(
        description = "Fetch a URL through the caching interceptor (GET, HEAD or OPTIONS; no request body). Returns the route, region, strategy, response source, status and body."
    )]
    async fn relay_fetch(&self, params: Parameters<RelayFetchParams>) -> Result<CallToolResult, McpError> {
        relay_impl(&self.interceptor, params.0).await
    }

    #[tool(description = "List persisted cache regions with entry counts and whether each is in the current region set.")]
    async fn region_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(self.interceptor.backend().as_ref(), &self.config).await
    }

    #[tool(description = "List the request URLs stored in a region, oldest insertion first.")]
    async fn region_keys(&self, params: Parameters<RegionKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(self.interceptor.backend().as_ref(), params.0).await
    }

    /// Evict the oldest entries of a region, or delete it.
    #[tool(description = "Trim a region to its newest max_entries entries, or delete it entirely with delete=true.")]
    async fn region_trim(&self, params: Parameters<RegionTrimParams>) -> Result<CallToolResult, McpError> {
        trim_impl(self.interceptor.backend().clone(), params.0).await
    }
}

impl ServerHandler for WaypostServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "waypost".into(),
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
