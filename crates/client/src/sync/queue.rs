//! Pending-items queue seam.
//!
//! The queue owns durability. The sync manager only reads pending items and
//! reports each confirmed delivery back, so anything not confirmed stays
//! queued for the next connectivity-restored signal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cloister_core::Error;
use serde::{Deserialize, Serialize};

/// A queued write (visit record, chat message, ...). The payload is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingItem {
    pub id: String,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait PendingQueue: Send + Sync {
    /// Items still awaiting delivery for `tag`, oldest first.
    async fn pending(&self, tag: &str) -> Result<Vec<PendingItem>, Error>;

    /// Record that `id` was delivered and can be discarded.
    async fn complete(&self, tag: &str, id: &str) -> Result<(), Error>;
}

/// In-process queue. Contents do not survive a restart.
#[derive(Default)]
pub struct MemoryQueue {
    items: Mutex<HashMap<String, Vec<PendingItem>>>,
    next_id: AtomicU64,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a payload under `tag`, returning its id.
    pub fn enqueue(&self, tag: &str, payload: serde_json::Value) -> String {
        let id = format!("{tag}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tag.to_string())
            .or_default()
            .push(PendingItem { id: id.clone(), payload });
        id
    }

    pub fn len(&self, tag: &str) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl PendingQueue for MemoryQueue {
    async fn pending(&self, tag: &str) -> Result<Vec<PendingItem>, Error> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(tag).cloned().unwrap_or_default())
    }

    async fn complete(&self, tag: &str, id: &str) -> Result<(), Error> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = items
            .get_mut(tag)
            .ok_or_else(|| Error::Queue(format!("no queue for tag {tag}")))?;
        let before = queue.len();
        queue.retain(|item| item.id != id);
        if queue.len() == before {
            return Err(Error::Queue(format!("item {id} not pending under {tag}")));
        }
        Ok(())
    }
}
