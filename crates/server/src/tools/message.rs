//! worker_message tool implementation.

use cloister_client::{WorkerEvent, WorkerMessage, WorkerOutcome};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, unexpected};
use crate::error::ToolError;
use crate::state::WorkerState;

/// Input parameters for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message object, e.g. {"type": "SKIP_WAITING"}, {"type": "GET_VERSION"}
    /// or {"type": "CACHE_MONASTERY", "id": "42"}.
    pub message: serde_json::Value,
}

pub async fn message_impl(state: &WorkerState, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let message: WorkerMessage = serde_json::from_value(params.message)
        .map_err(|e| ToolError::InvalidInput(format!("unrecognized message: {e}")))?;

    match state.worker.dispatch(WorkerEvent::Message(message)).await? {
        WorkerOutcome::Replied(reply) => json_result(&reply),
        other => Err(unexpected(&other)),
    }
}
