//! Core types and shared functionality for cloister.
//!
//! This crate provides:
//! - Request/response types shared by every component
//! - Region-partitioned cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStore, RegionHandle};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Destination, Request, Response};
