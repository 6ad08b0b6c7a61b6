//! Interception engine for cloister.
//!
//! This crate provides the network boundary, request routing, the caching
//! strategies with their offline fallback, install/activate lifecycle,
//! deferred sync, and the worker that dispatches host events to all of them.

pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod router;
pub mod strategy;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchConfig, HttpNetwork, Network};
pub use lifecycle::{ActivateReport, InstallReport, Lifecycle, LifecycleState};
pub use message::{MessageReply, WorkerMessage};
pub use router::{Route, Router};
pub use strategy::{KeepAlive, OfflineFallback, Regions, Served, Source, Strategy, StrategyEngine};
pub use sync::{
    BroadcastObservers, ClientMessage, MemoryQueue, Observers, PendingItem, PendingQueue, SyncManager, SyncReport,
};
pub use worker::{EventKind, Worker, WorkerEvent, WorkerOutcome};
