//! cache_purge tool implementation.
//!
//! Drops one named region and every entry in it.

use cloister_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::WorkerState;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Region name, e.g. "cloister-dynamic-v1".
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub region: String,
    /// False if no region had that name.
    pub deleted: bool,
}

pub async fn purge_impl(state: &WorkerState, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.region.trim().is_empty() {
        return Err(Error::InvalidInput("region cannot be empty".into()).into());
    }

    let deleted = state.db.delete_region(&params.region).await?;
    if deleted {
        tracing::info!(region = %params.region, "purged cache region");
    }

    json_result(&CachePurgeOutput { region: params.region, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::result_json;
    use cloister_core::{Request, Response};

    #[tokio::test]
    async fn test_purge_requires_name() {
        let state = WorkerState::for_tests().await;
        let err = purge_impl(&state, CachePurgeParams { region: "".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_purge_existing_and_missing() {
        let state = WorkerState::for_tests().await;
        let request = Request::get(url::Url::parse("http://127.0.0.1:9/api/x").unwrap());
        state.db.put("cloister-dynamic-v1", &request, &Response::new(200, "OK", "{}")).await.unwrap();

        let output = result_json(&purge_impl(&state, CachePurgeParams { region: "cloister-dynamic-v1".into() }).await.unwrap());
        assert_eq!(output["deleted"], true);
        assert!(state.db.match_request(None, &request).await.unwrap().is_none());

        let output = result_json(&purge_impl(&state, CachePurgeParams { region: "cloister-dynamic-v1".into() }).await.unwrap());
        assert_eq!(output["deleted"], false);
    }
}
