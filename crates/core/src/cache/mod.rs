//! SQLite-backed response cache partitioned into named regions.
//!
//! This module provides a persistent cache using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Request-identity keys derived from method and URL (SHA-256)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Atomic batch writes and wholesale region eviction

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod regions;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use regions::RegionHandle;
pub use store::CacheStore;
