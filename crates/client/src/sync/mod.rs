//! Deferred sync: replay queued writes once connectivity returns.
//!
//! Items are posted one at a time, in queue order. The first failure aborts
//! the batch; items after it are left for the next signal. Observers only hear
//! about batches that went through completely.

pub mod observers;
pub mod queue;

use std::sync::Arc;

use cloister_core::config::SyncTarget;
use cloister_core::{AppConfig, Error};
use serde::Serialize;
use url::Url;

pub use observers::{BroadcastObservers, ClientMessage, Observers};
pub use queue::{MemoryQueue, PendingItem, PendingQueue};

use crate::fetch::{Network, resolve};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub tag: String,
    pub synced: usize,
}

pub struct SyncManager {
    network: Arc<dyn Network>,
    queue: Arc<dyn PendingQueue>,
    observers: Arc<dyn Observers>,
    origin: Url,
    targets: Vec<SyncTarget>,
}

impl SyncManager {
    pub fn new(
        network: Arc<dyn Network>, queue: Arc<dyn PendingQueue>, observers: Arc<dyn Observers>, origin: Url,
        targets: Vec<SyncTarget>,
    ) -> Self {
        Self { network, queue, observers, origin, targets }
    }

    pub fn from_config(
        config: &AppConfig, network: Arc<dyn Network>, queue: Arc<dyn PendingQueue>, observers: Arc<dyn Observers>,
    ) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self::new(network, queue, observers, origin, config.sync_targets.clone()))
    }

    fn endpoint(&self, tag: &str) -> Result<Url, Error> {
        let target = self
            .targets
            .iter()
            .find(|t| t.tag == tag)
            .ok_or_else(|| Error::UnknownSyncTag(tag.to_string()))?;
        resolve(&self.origin, &target.endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {e}", target.endpoint)))
    }

    /// Drain the queue for `tag`.
    pub async fn sync(&self, tag: &str) -> Result<SyncReport, Error> {
        let endpoint = self.endpoint(tag)?;
        let items = self.queue.pending(tag).await?;
        tracing::info!(tag, pending = items.len(), "replaying deferred writes");

        let mut synced = 0;
        for item in &items {
            let response = self
                .network
                .post_json(&endpoint, &item.payload)
                .await
                .map_err(|e| Error::SyncFailed { tag: tag.to_string(), reason: format!("item {}: {e}", item.id) })?;

            if !response.is_success() {
                return Err(Error::SyncFailed {
                    tag: tag.to_string(),
                    reason: format!("item {}: status {}", item.id, response.status),
                });
            }

            self.queue.complete(tag, &item.id).await?;
            synced += 1;
        }

        self.observers.publish(ClientMessage::SyncComplete { synced });
        tracing::info!(tag, synced, "deferred sync complete");

        Ok(SyncReport { tag: tag.to_string(), synced })
    }
}
