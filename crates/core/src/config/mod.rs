//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CLOISTER_*)
//! 2. TOML config file (if CLOISTER_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The loaded value is constructed once at startup and handed to every
//! component; nothing reads worker-wide state from globals.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Maps a background-sync tag to the endpoint its pending items are posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTarget {
    pub tag: String,
    pub endpoint: String,
}

/// Appearance of synthesized offline responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Application name shown on the offline HTML page.
    #[serde(default = "default_offline_title")]
    pub title: String,

    /// Placeholder image canvas width in pixels.
    #[serde(default = "default_image_width")]
    pub image_width: u32,

    /// Placeholder image canvas height in pixels.
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            title: default_offline_title(),
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CLOISTER_*)
/// 2. TOML config file (if CLOISTER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via CLOISTER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix shared by every region name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Cache version. Bumping it renames both regions, and activation then
    /// discards everything stored under the old names.
    ///
    /// Set via CLOISTER_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin of the host application (scheme, host, port).
    ///
    /// Set via CLOISTER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Assets pre-warmed into the static region at install. Relative entries
    /// resolve against `origin`; absolute entries double as the cross-origin
    /// cache-first allowlist.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Regular expressions matched against the request path that route to network-first.
    #[serde(default = "default_dynamic_patterns")]
    pub dynamic_patterns: Vec<String>,

    /// Background-sync tags and the endpoints they replay to.
    #[serde(default = "default_sync_targets")]
    pub sync_targets: Vec<SyncTarget>,

    #[serde(default)]
    pub offline: OfflineConfig,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cloister-cache.sqlite")
}

fn default_cache_prefix() -> String {
    "cloister".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_user_agent() -> String {
    "cloister/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_dynamic_patterns() -> Vec<String> {
    vec![r"^/api/".into(), r"^/monastery/".into(), r"\.(?:png|jpg|jpeg|gif|webp|svg)$".into()]
}

fn default_sync_targets() -> Vec<SyncTarget> {
    vec![
        SyncTarget { tag: "sync-visits".into(), endpoint: "/api/monastery-visits".into() },
        SyncTarget { tag: "sync-chat-messages".into(), endpoint: "/api/chat-messages".into() },
    ]
}

fn default_offline_title() -> String {
    "Cloister".into()
}

fn default_image_width() -> u32 {
    400
}

fn default_image_height() -> u32 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            static_assets: default_static_assets(),
            dynamic_patterns: default_dynamic_patterns(),
            sync_targets: default_sync_targets(),
            offline: OfflineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the region holding pre-warmed and cache-first responses.
    pub fn static_cache_name(&self) -> String {
        format!("{}-static-{}", self.cache_prefix, self.cache_version)
    }

    /// Name of the region holding network-first and revalidated responses.
    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-dynamic-{}", self.cache_prefix, self.cache_version)
    }

    /// Parsed host application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Endpoint configured for a sync tag, if any.
    pub fn endpoint_for(&self, tag: &str) -> Option<&str> {
        self.sync_targets
            .iter()
            .find(|t| t.tag == tag)
            .map(|t| t.endpoint.as_str())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CLOISTER_` (nested keys use `__`)
    /// 2. TOML file from `CLOISTER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CLOISTER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CLOISTER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./cloister-cache.sqlite"));
        assert_eq!(config.user_agent, "cloister/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.dynamic_patterns.len(), 3);
        assert_eq!(config.offline.image_width, 400);
        assert_eq!(config.offline.image_height, 300);
    }

    #[test]
    fn test_region_names_are_version_qualified() {
        let config = AppConfig::default();
        assert_eq!(config.static_cache_name(), "cloister-static-v1");
        assert_eq!(config.dynamic_cache_name(), "cloister-dynamic-v1");

        let bumped = AppConfig { cache_version: "v2".into(), ..Default::default() };
        assert_ne!(bumped.static_cache_name(), config.static_cache_name());
        assert_ne!(bumped.dynamic_cache_name(), config.dynamic_cache_name());
    }

    #[test]
    fn test_endpoint_for() {
        let config = AppConfig::default();
        assert_eq!(config.endpoint_for("sync-visits"), Some("/api/monastery-visits"));
        assert_eq!(config.endpoint_for("sync-chat-messages"), Some("/api/chat-messages"));
        assert_eq!(config.endpoint_for("sync-unknown"), None);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        assert_eq!(config.origin_url().unwrap().host_str(), Some("localhost"));

        let broken = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(broken.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }
}
