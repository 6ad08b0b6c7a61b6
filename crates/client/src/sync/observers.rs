//! Messages published to controlled client contexts.

use serde::Serialize;
use tokio::sync::broadcast;

/// Wire shape: `{"type": "SYNC_COMPLETE", "data": {"synced": 3}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    SyncComplete { synced: usize },
}

/// Fan-out to every controlled client. Publishing never blocks or fails.
pub trait Observers: Send + Sync {
    fn publish(&self, message: ClientMessage);
}

/// [`Observers`] backed by a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastObservers {
    tx: broadcast::Sender<ClientMessage>,
}

impl BroadcastObservers {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.tx.subscribe()
    }
}

impl Observers for BroadcastObservers {
    fn publish(&self, message: ClientMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("no clients listening for client messages");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_complete_wire_shape() {
        let json = serde_json::to_value(ClientMessage::SyncComplete { synced: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SYNC_COMPLETE", "data": {"synced": 3}}));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let observers = BroadcastObservers::new(8);
        let mut rx = observers.subscribe();
        observers.publish(ClientMessage::SyncComplete { synced: 2 });
        assert_eq!(rx.recv().await.unwrap(), ClientMessage::SyncComplete { synced: 2 });
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        BroadcastObservers::new(1).publish(ClientMessage::SyncComplete { synced: 0 });
    }
}
