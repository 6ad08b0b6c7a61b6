//! Typed commands sent from client contexts to the worker.

use serde::{Deserialize, Serialize};

/// Inbound command. Wire shape: `{"type": "CACHE_MONASTERY", "id": "42"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate a waiting install immediately.
    SkipWaiting,
    GetVersion,
    /// Pre-cache the detail, images and tour resources of one monastery.
    CacheMonastery {
        #[serde(alias = "monasteryId")]
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageReply {
    Ack { activated: bool },
    Version { version: String },
    Cached { id: String, cached: usize },
}

/// Paths fetched for `CACHE_MONASTERY`.
pub fn monastery_paths(id: &str) -> [String; 3] {
    [
        format!("/api/monastery/{id}"),
        format!("/api/monastery/{id}/images"),
        format!("/api/monastery/{id}/360-tour"),
    ]
}
