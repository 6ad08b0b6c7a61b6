//! Tracking for work that outlives the request that started it.
//!
//! Background revalidation keeps running after its caller already has a
//! response. The host must not tear the worker down until that work settles,
//! so every such task is registered here.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;

#[derive(Clone, Default)]
pub struct KeepAlive {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl KeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` on the current runtime and hold the worker open until it finishes.
    ///
    /// Tasks that already finished are reaped first, so the set only holds
    /// work that is still running.
    pub fn extend<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "background task did not complete");
            }
        }
        tasks.spawn(fut);
    }

    /// Number of registered tasks that have not been reaped yet.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Wait for every registered task, including ones registered while waiting.
    ///
    /// Returns how many tasks settled.
    pub async fn settle(&self) -> usize {
        let mut settled = 0;
        loop {
            let mut batch = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if batch.is_empty() {
                return settled;
            }
            while let Some(result) = batch.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "background task did not complete");
                }
                settled += 1;
            }
        }
    }
}
