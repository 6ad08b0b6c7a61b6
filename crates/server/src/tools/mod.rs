//! MCP tool implementations.
//!
//! Each tool delivers one host-runtime event to the worker and returns the
//! outcome as pretty-printed JSON.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod sync;

pub use fetch::WorkerFetchParams;
pub use message::WorkerMessageParams;
pub use sync::{SyncEnqueueParams, WorkerSyncParams};

use cloister_client::WorkerOutcome;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Serialize a tool output as a single text content block.
pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ToolError::Output(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// The worker answered an event with an outcome belonging to another event kind.
pub(crate) fn unexpected(outcome: &WorkerOutcome) -> McpError {
    ToolError::Output(format!("unexpected worker outcome: {outcome:?}")).into()
}

#[cfg(test)]
pub(crate) fn result_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
