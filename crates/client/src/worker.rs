//! Event dispatch.
//!
//! The host runtime delivers lifecycle, fetch, sync, and message events. Each
//! event kind maps to exactly one handler here; the handler is awaited to
//! completion so the host never tears the worker down mid-event.

use std::sync::Arc;

use cloister_core::{AppConfig, CacheStore, Error, Request};
use url::Url;

use crate::fetch::{Network, resolve};
use crate::lifecycle::{ActivateReport, InstallReport, Lifecycle, LifecycleState};
use crate::message::{MessageReply, WorkerMessage, monastery_paths};
use crate::router::{Route, Router};
use crate::strategy::{OfflineFallback, Regions, Served, StrategyEngine};
use crate::sync::{Observers, PendingQueue, SyncManager, SyncReport};

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Sync { tag: String },
    Message(WorkerMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Sync,
    Message,
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Sync { .. } => EventKind::Sync,
            WorkerEvent::Message(_) => EventKind::Message,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    /// Install finished; `activation` is set when skip-waiting activated it right away.
    Installed { install: InstallReport, activation: Option<ActivateReport> },
    Activated(ActivateReport),
    /// `None` means the request passed through untouched.
    Fetched(Option<Served>),
    Synced(SyncReport),
    Replied(MessageReply),
}

pub struct Worker {
    version: String,
    origin: Url,
    router: Router,
    engine: StrategyEngine,
    lifecycle: Lifecycle,
    sync: SyncManager,
}

impl Worker {
    /// Wire every component from one configuration value.
    pub fn new(
        config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>, queue: Arc<dyn PendingQueue>,
        observers: Arc<dyn Observers>,
    ) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let engine = StrategyEngine::new(
            store.clone(),
            network.clone(),
            Regions::from_config(config),
            OfflineFallback::from_config(&config.offline),
        );

        Ok(Self {
            version: config.cache_version.clone(),
            origin,
            router: Router::from_config(config)?,
            engine,
            lifecycle: Lifecycle::from_config(config, store, network.clone())?,
            sync: SyncManager::from_config(config, network, queue, observers)?,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn regions(&self) -> &Regions {
        self.engine.regions()
    }

    pub async fn dispatch(&self, event: WorkerEvent) -> Result<WorkerOutcome, Error> {
        tracing::debug!(kind = ?event.kind(), "dispatching worker event");
        match event {
            WorkerEvent::Install => self.on_install().await,
            WorkerEvent::Activate => Ok(WorkerOutcome::Activated(self.lifecycle.activate().await?)),
            WorkerEvent::Fetch(request) => Ok(WorkerOutcome::Fetched(self.on_fetch(&request).await)),
            WorkerEvent::Sync { tag } => Ok(WorkerOutcome::Synced(self.sync.sync(&tag).await?)),
            WorkerEvent::Message(message) => Ok(WorkerOutcome::Replied(self.on_message(message).await?)),
        }
    }

    async fn on_install(&self) -> Result<WorkerOutcome, Error> {
        let install = self.lifecycle.install().await?;
        let activation = self.lifecycle.activate_if_skipping().await?;
        Ok(WorkerOutcome::Installed { install, activation })
    }

    /// Route and resolve one request. `None` means pass-through.
    pub async fn on_fetch(&self, request: &Request) -> Option<Served> {
        match self.router.classify(request) {
            Route::Passthrough => {
                tracing::debug!(method = %request.method, url = %request.url, "passing request through");
                None
            }
            Route::Intercept(strategy) => {
                tracing::debug!(url = %request.url, ?strategy, "intercepting request");
                Some(self.engine.respond(strategy, request).await)
            }
        }
    }

    async fn on_message(&self, message: WorkerMessage) -> Result<MessageReply, Error> {
        match message {
            WorkerMessage::SkipWaiting => {
                self.lifecycle.skip_waiting();
                let activated = self.lifecycle.activate_if_skipping().await?.is_some();
                Ok(MessageReply::Ack { activated })
            }
            WorkerMessage::GetVersion => Ok(MessageReply::Version { version: self.version.clone() }),
            WorkerMessage::CacheMonastery { id } => {
                if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                    return Err(Error::InvalidInput(format!("invalid monastery id: {id:?}")));
                }
                let requests = monastery_paths(&id)
                    .iter()
                    .map(|path| resolve(&self.origin, path).map(Request::get))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| Error::InvalidUrl(e.to_string()))?;
                let cached = self.engine.warm(&requests).await;
                Ok(MessageReply::Cached { id, cached })
            }
        }
    }

    /// Wait for background revalidation to finish.
    pub async fn settle(&self) -> usize {
        self.engine.keep_alive().settle().await
    }
}
