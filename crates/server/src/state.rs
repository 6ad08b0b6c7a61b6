//! Long-lived state shared by every tool call.

use std::sync::Arc;

use cloister_client::{BroadcastObservers, FetchConfig, HttpNetwork, MemoryQueue, Network, Worker};
use cloister_core::{AppConfig, CacheDb, Error};

/// Everything one worker instance owns.
pub struct WorkerState {
    pub config: AppConfig,
    pub db: CacheDb,
    pub network: Arc<dyn Network>,
    pub queue: Arc<MemoryQueue>,
    pub observers: BroadcastObservers,
    pub worker: Worker,
}

impl WorkerState {
    /// Open the cache database and wire the worker over the real network.
    pub async fn open(config: AppConfig) -> Result<Self, Error> {
        let db = CacheDb::open(&config.db_path).await?;
        let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from_config(&config))?);
        Self::with_parts(config, db, network)
    }

    pub fn with_parts(config: AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let queue = Arc::new(MemoryQueue::new());
        let observers = BroadcastObservers::new(64);
        let worker = Worker::new(
            &config,
            Arc::new(db.clone()),
            network.clone(),
            queue.clone(),
            Arc::new(observers.clone()),
        )?;
        Ok(Self { config, db, network, queue, observers, worker })
    }

    /// In-memory state for tests. The origin points at a closed local port so
    /// every network call fails fast.
    #[cfg(test)]
    pub async fn for_tests() -> Arc<Self> {
        let config = AppConfig {
            origin: "http://127.0.0.1:9".into(),
            static_assets: vec!["/".into()],
            timeout_ms: 500,
            ..Default::default()
        };
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from_config(&config)).unwrap());
        Arc::new(Self::with_parts(config, db, network).unwrap())
    }
}
