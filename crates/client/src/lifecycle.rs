//! Install and activation.
//!
//! Install pre-warms the static region with every configured asset, all or
//! nothing. Activation drops every region that does not belong to the current
//! version. A version bump is nothing more than new region names; old data is
//! discarded, never migrated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cloister_core::{AppConfig, CacheStore, Error, Request, Response};
use futures_util::future::join_all;
use serde::Serialize;
use url::Url;

use crate::fetch::{Network, resolve};
use crate::strategy::Regions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    InstalledWaiting,
    Active,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub region: String,
    pub cached: usize,
    /// Take over immediately instead of waiting for existing clients to close.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    /// Take control of every open client context.
    pub claimed: bool,
}

pub struct Lifecycle {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    regions: Regions,
    assets: Vec<Url>,
    state: Mutex<LifecycleState>,
    skip_waiting: AtomicBool,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Network>, regions: Regions, assets: Vec<Url>) -> Self {
        Self {
            store,
            network,
            regions,
            assets,
            state: Mutex::new(LifecycleState::Uninstalled),
            skip_waiting: AtomicBool::new(false),
        }
    }

    /// Resolve the configured static assets against the origin.
    pub fn from_config(config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let assets = config
            .static_assets
            .iter()
            .map(|asset| resolve(&origin, asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(store, network, Regions::from_config(config), assets))
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Request activation without waiting for existing clients to close.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Populate the static region with every asset.
    ///
    /// All assets are fetched before anything is written. Any transport failure
    /// or non-2xx status fails the whole install and leaves the store untouched;
    /// the host is expected to retry from scratch.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == LifecycleState::Installing {
                return Err(Error::InvalidInput("install already in progress".into()));
            }
            *state = LifecycleState::Installing;
        }

        match self.populate().await {
            Ok(cached) => {
                self.set_state(LifecycleState::InstalledWaiting);
                self.skip_waiting();
                tracing::info!(region = %self.regions.static_name, cached, "install complete");
                Ok(InstallReport {
                    region: self.regions.static_name.clone(),
                    cached,
                    skip_waiting: self.skip_waiting_requested(),
                })
            }
            Err(e) => {
                self.set_state(LifecycleState::Uninstalled);
                tracing::warn!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize, Error> {
        let fetches = self.assets.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self.network.fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::HttpStatus { status: response.status, url: url.to_string() });
            }
            Ok::<(Request, Response), Error>((request, response))
        });

        let entries = join_all(fetches)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InstallFailed(e.to_string()))?;

        self.store
            .put_all(&self.regions.static_name, &entries)
            .await
            .map_err(|e| Error::InstallFailed(e.to_string()))
    }

    /// Activate now if an install is waiting and skip-waiting was requested.
    ///
    /// Returns `None` when the machine keeps waiting.
    pub async fn activate_if_skipping(&self) -> Result<Option<ActivateReport>, Error> {
        if self.state() != LifecycleState::InstalledWaiting || !self.skip_waiting_requested() {
            return Ok(None);
        }
        self.activate().await.map(Some)
    }

    /// Delete every region outside the current keep set and claim clients.
    ///
    /// A pending skip-waiting request is consumed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        if self.state() == LifecycleState::Uninstalled || self.state() == LifecycleState::Installing {
            return Err(Error::InvalidInput(format!("cannot activate from state {:?}", self.state())));
        }

        let deleted = self.store.delete_regions_not_in(&self.regions.keep_set()).await?;
        for name in &deleted {
            tracing::info!(region = %name, "deleted stale cache region");
        }

        self.set_state(LifecycleState::Active);
        self.skip_waiting.store(false, Ordering::SeqCst);
        Ok(ActivateReport { deleted, claimed: true })
    }
}
