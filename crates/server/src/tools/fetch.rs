//! worker_fetch tool implementation.
//!
//! Intercepted requests are resolved by the worker's strategies. Anything the
//! router passes through goes to the network unmodified.

use cloister_client::fetch::resolve;
use cloister_core::{Destination, Error, Request, Response};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::WorkerState;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a root-relative path resolved against the application origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET is intercepted.
    #[serde(default = "default_method")]
    pub method: String,

    /// How the client will use the response: "document", "image" or "other".
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    /// False when the request bypassed every strategy.
    pub intercepted: bool,
    /// "cache", "network" or "offline".
    pub source: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<HeaderEntry>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

impl WorkerFetchOutput {
    fn new(url: String, intercepted: bool, source: &str, response: Response) -> Self {
        Self {
            url,
            intercepted,
            source: source.to_string(),
            status: response.status,
            status_text: response.status_text,
            headers: response
                .headers
                .into_iter()
                .map(|(name, value)| HeaderEntry { name, value })
                .collect(),
            body: String::from_utf8_lossy(&response.body).to_string(),
            body_bytes: response.body.len(),
        }
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(state: &WorkerState, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve(state.worker.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::new(&params.method, url, params.destination);

    let output = match state.worker.on_fetch(&request).await {
        Some(served) => {
            WorkerFetchOutput::new(request.url.to_string(), true, served.source.as_str(), served.response)
        }
        None => {
            let response = state.network.fetch(&request).await?;
            WorkerFetchOutput::new(request.url.to_string(), false, "network", response)
        }
    };

    json_result(&output)
}
