//! Unified error types for cloister.
//!
//! Every variant carries a stable code prefix so callers on the far side of the
//! MCP boundary can tell failure classes apart.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the cloister worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unsupported message type).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Transport-level failure: the network could not be reached.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The network answered with a non-2xx status where success was required.
    #[error("HTTP_STATUS: {status} {url}")]
    HttpStatus { status: u16, url: String },

    /// Pre-warming the static region failed; the host must retry install.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// A deferred-sync batch was aborted.
    #[error("SYNC_FAILED: {tag}: {reason}")]
    SyncFailed { tag: String, reason: String },

    /// No endpoint is configured for the sync tag.
    #[error("UNKNOWN_SYNC_TAG: {0}")]
    UnknownSyncTag(String),

    /// The pending-items queue collaborator failed.
    #[error("QUEUE_ERROR: {0}")]
    Queue(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::Network(msg) => (-32006, msg.clone()),
            Error::HttpStatus { .. } => (-32008, err.to_string()),
            Error::InstallFailed(msg) => (-32020, msg.clone()),
            Error::SyncFailed { .. } => (-32021, err.to_string()),
            Error::UnknownSyncTag(tag) => (-32022, format!("no endpoint configured for sync tag {tag}")),
            Error::Queue(msg) => (-32023, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
