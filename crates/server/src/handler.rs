//! MCP server handler implementation.
//!
//! Each tool maps one host-runtime event (or an inspection call) onto the
//! shared worker state.
use std::sync::Arc;

use crate::state::WorkerState;
use crate::tools::{
    SyncEnqueueParams, WorkerFetchParams, WorkerMessageParams, WorkerSyncParams,
    cache::{CachePurgeParams, purge_impl, regions_impl},
    fetch::fetch_impl,
    lifecycle::{activate_impl, install_impl},
    message::message_impl,
    sync::{enqueue_impl, sync_impl},
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

/// The MCP server handler for cloister-worker.
#[derive(Clone)]
pub struct CloisterServer {
    tool_router: ToolRouter<Self>,
    state: Arc<WorkerState>,
}

#[tool_router]
impl CloisterServer {
    pub fn new(state: Arc<WorkerState>) -> Self {
        Self { tool_router: Self::tool_router(), state }
    }

    #[tool(
        description = "Run the install event: fetch every static asset into the versioned static cache (all or nothing), then activate."
    )]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.state).await
    }

    #[tool(description = "Run the activate event: delete every cache region that does not belong to the current version.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    /// Intercepted GETs are answered by cache-first, network-first or
    /// stale-while-revalidate; everything else goes straight to the network.
    #[tool(
        description = "Deliver a fetch event. Returns the response the worker would serve and whether it came from cache, network or the offline fallback."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Deliver a background-sync event: replay queued writes for a tag in order, stopping at the first failure.")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.state, params.0).await
    }

    #[tool(
        description = "Post a client message to the worker: SKIP_WAITING, GET_VERSION or CACHE_MONASTERY with an id."
    )]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.state, params.0).await
    }

    #[tool(description = "Queue a JSON write under a sync tag for delivery on the next worker_sync.")]
    async fn sync_enqueue(&self, params: Parameters<SyncEnqueueParams>) -> Result<CallToolResult, McpError> {
        enqueue_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache regions with entry counts, flagging which belong to the current version.")]
    async fn cache_regions(&self) -> Result<CallToolResult, McpError> {
        regions_impl(&self.state).await
    }

    #[tool(description = "Delete one cache region and all of its entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.state, params.0).await
    }
}

impl ServerHandler for CloisterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "cloister-worker".into(),
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
