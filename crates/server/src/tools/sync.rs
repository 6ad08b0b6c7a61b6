//! worker_sync and sync_enqueue tools.

use cloister_client::{WorkerEvent, WorkerOutcome};
use cloister_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, unexpected};
use crate::state::WorkerState;

/// Input parameters for worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync tag, e.g. "sync-visits" or "sync-chat-messages".
    pub tag: String,
}

/// Input parameters for sync_enqueue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncEnqueueParams {
    pub tag: String,
    /// JSON body posted to the tag's endpoint on the next sync.
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncEnqueueOutput {
    pub tag: String,
    pub id: String,
    pub pending: usize,
}

/// Replay every queued write for a tag.
pub async fn sync_impl(state: &WorkerState, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    match state.worker.dispatch(WorkerEvent::Sync { tag: params.tag }).await? {
        WorkerOutcome::Synced(report) => json_result(&report),
        other => Err(unexpected(&other)),
    }
}

/// Queue a write for deferred delivery.
///
/// Tags without a configured endpoint are rejected up front so nothing is
/// queued that no sync could ever drain.
pub async fn enqueue_impl(state: &WorkerState, params: SyncEnqueueParams) -> Result<CallToolResult, McpError> {
    if state.config.endpoint_for(&params.tag).is_none() {
        return Err(Error::UnknownSyncTag(params.tag).into());
    }

    let id = state.queue.enqueue(&params.tag, params.payload);
    let pending = state.queue.len(&params.tag);
    tracing::debug!(tag = %params.tag, %id, pending, "queued deferred write");

    json_result(&SyncEnqueueOutput { tag: params.tag, id, pending })
}
