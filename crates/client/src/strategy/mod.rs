//! Interception strategies.
//!
//! Each strategy resolves a request from the cache, the network, or the
//! offline synthesizer, and always produces a response:
//!
//! - **Cache-first**: cached copy if any, else network (stored into the static
//!   region on 2xx), else offline fallback.
//! - **Network-first**: network (stored into the dynamic region on 2xx), else
//!   cached copy, else offline fallback.
//! - **Stale-while-revalidate**: cached copy immediately while a background
//!   fetch refreshes the dynamic region for the next request; on a miss, wait
//!   for the network, else offline fallback.
//!
//! Cache store failures are logged and treated as misses or no-op writes.

pub mod keepalive;
pub mod offline;

use std::sync::Arc;

use cloister_core::{AppConfig, CacheStore, Request, Response};
use serde::Serialize;

pub use keepalive::KeepAlive;
pub use offline::OfflineFallback;

use crate::fetch::Network;

/// The three ways a GET can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Network,
    Offline,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Network => "network",
            Source::Offline => "offline",
        }
    }
}

/// A response together with its origin.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl Served {
    fn cache(response: Response) -> Self {
        Self { response, source: Source::Cache }
    }

    fn network(response: Response) -> Self {
        Self { response, source: Source::Network }
    }

    fn offline(response: Response) -> Self {
        Self { response, source: Source::Offline }
    }
}

/// Names of the two live regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regions {
    pub static_name: String,
    pub dynamic_name: String,
}

impl Regions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { static_name: config.static_cache_name(), dynamic_name: config.dynamic_cache_name() }
    }

    /// The keep set used at activation.
    pub fn keep_set(&self) -> Vec<String> {
        vec![self.static_name.clone(), self.dynamic_name.clone()]
    }
}

pub struct StrategyEngine {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    regions: Regions,
    fallback: OfflineFallback,
    keep_alive: KeepAlive,
}

impl StrategyEngine {
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn Network>, regions: Regions, fallback: OfflineFallback,
    ) -> Self {
        Self { store, network, regions, fallback, keep_alive: KeepAlive::new() }
    }

    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    pub fn keep_alive(&self) -> &KeepAlive {
        &self.keep_alive
    }

    pub async fn respond(&self, strategy: Strategy, request: &Request) -> Served {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    pub async fn cache_first(&self, request: &Request) -> Served {
        if let Some(cached) = lookup(self.store.as_ref(), request).await {
            tracing::debug!(url = %request.url, "cache-first hit");
            return Served::cache(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    store(self.store.as_ref(), &self.regions.static_name, request, &response).await;
                }
                Served::network(response)
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "cache-first miss with network down; serving offline fallback");
                Served::offline(self.fallback.respond(request))
            }
        }
    }

    pub async fn network_first(&self, request: &Request) -> Served {
        let failure = match self.network.fetch(request).await {
            Ok(response) if response.is_success() => {
                store(self.store.as_ref(), &self.regions.dynamic_name, request, &response).await;
                return Served::network(response);
            }
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "network-first got non-success status");
                Some(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network-first fetch failed");
                None
            }
        };

        if let Some(cached) = lookup(self.store.as_ref(), request).await {
            return Served::cache(cached);
        }

        match failure {
            Some(response) => Served::network(response),
            None => Served::offline(self.fallback.respond(request)),
        }
    }

    pub async fn stale_while_revalidate(&self, request: &Request) -> Served {
        let cached = lookup(self.store.as_ref(), request).await;

        match cached {
            Some(cached) => {
                let store = self.store.clone();
                let network = self.network.clone();
                let region = self.regions.dynamic_name.clone();
                let request = request.clone();
                self.keep_alive.extend(async move {
                    revalidate(store.as_ref(), network.as_ref(), &region, &request).await;
                });
                Served::cache(cached)
            }
            None => {
                match revalidate(self.store.as_ref(), self.network.as_ref(), &self.regions.dynamic_name, request).await
                {
                    Some(response) => Served::network(response),
                    None => Served::offline(self.fallback.respond(request)),
                }
            }
        }
    }

    /// Fetch each request and store every 2xx into the dynamic region.
    ///
    /// Failures are skipped. Returns how many responses were stored.
    pub async fn warm(&self, requests: &[Request]) -> usize {
        let mut stored = 0;
        for request in requests {
            match self.network.fetch(request).await {
                Ok(response) if response.is_success() => {
                    if store(self.store.as_ref(), &self.regions.dynamic_name, request, &response).await {
                        stored += 1;
                    }
                }
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "not warming non-success response")
                }
                Err(e) => tracing::debug!(url = %request.url, error = %e, "warm fetch failed"),
            }
        }
        stored
    }
}

/// Look a request up across every region. Store failures read as a miss.
async fn lookup(store: &dyn CacheStore, request: &Request) -> Option<Response> {
    match store.match_request(None, request).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss");
            None
        }
    }
}

/// Store a copy of `response`. Store failures are a no-op.
async fn store(store: &dyn CacheStore, region: &str, request: &Request, response: &Response) -> bool {
    let copy = response.clone();
    match store.put(region, request, &copy).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(url = %request.url, region, error = %e, "cache put failed; continuing without caching");
            false
        }
    }
}

/// Network branch of stale-while-revalidate.
///
/// Stores a fresh 2xx copy into `region`. A network failure resolves to
/// whatever the cache holds instead of an error.
async fn revalidate(
    cache: &dyn CacheStore, network: &dyn Network, region: &str, request: &Request,
) -> Option<Response> {
    match network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                store(cache, region, request, &response).await;
            }
            Some(response)
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "revalidation failed; keeping cached copy");
            lookup(cache, request).await
        }
    }
}
