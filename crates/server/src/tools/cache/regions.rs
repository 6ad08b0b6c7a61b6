//! cache_regions tool implementation.
//!
//! Lists every named region in creation order with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::WorkerState;
use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegionSummary {
    pub name: String,
    pub entries: usize,
    /// False for regions left behind by an earlier version.
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRegionsOutput {
    pub version: String,
    pub regions: Vec<RegionSummary>,
}

pub async fn regions_impl(state: &WorkerState) -> Result<CallToolResult, McpError> {
    let keep = state.worker.regions().keep_set();

    let mut regions = Vec::new();
    for name in state.db.list_regions().await? {
        let entries = state.db.region_len(&name).await?;
        let current = keep.contains(&name);
        regions.push(RegionSummary { name, entries, current });
    }

    json_result(&CacheRegionsOutput { version: state.worker.version().to_string(), regions })
}
