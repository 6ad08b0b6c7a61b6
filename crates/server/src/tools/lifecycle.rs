//! worker_install and worker_activate tools.

use cloister_client::{ActivateReport, InstallReport, WorkerEvent, WorkerOutcome};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use super::{json_result, unexpected};
use crate::state::WorkerState;

#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub install: InstallReport,
    pub activation: Option<ActivateReport>,
}

/// Pre-warm the static region, then activate if skip-waiting was signalled.
pub async fn install_impl(state: &WorkerState) -> Result<CallToolResult, McpError> {
    match state.worker.dispatch(WorkerEvent::Install).await? {
        WorkerOutcome::Installed { install, activation } => json_result(&InstallOutput { install, activation }),
        other => Err(unexpected(&other)),
    }
}

/// Evict every region outside the current version.
pub async fn activate_impl(state: &WorkerState) -> Result<CallToolResult, McpError> {
    match state.worker.dispatch(WorkerEvent::Activate).await? {
        WorkerOutcome::Activated(report) => json_result(&report),
        other => Err(unexpected(&other)),
    }
}
