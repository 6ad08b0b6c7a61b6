//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_prefix` or `cache_version` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - a dynamic pattern is not a valid regular expression
    /// - a sync tag is empty, duplicated, or has an empty endpoint
    /// - the offline image canvas has a zero dimension
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }
        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {}", origin.scheme()),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for pattern in &self.dynamic_patterns {
            regex::Regex::new(pattern).map_err(|e| ConfigError::Invalid {
                field: "dynamic_patterns".into(),
                reason: format!("{pattern}: {e}"),
            })?;
        }

        let mut tags = HashSet::new();
        for target in &self.sync_targets {
            if target.tag.is_empty() || target.endpoint.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "sync_targets".into(),
                    reason: "tag and endpoint must not be empty".into(),
                });
            }
            if !tags.insert(target.tag.as_str()) {
                return Err(ConfigError::Invalid {
                    field: "sync_targets".into(),
                    reason: format!("duplicate tag: {}", target.tag),
                });
            }
        }

        if self.offline.image_width == 0 || self.offline.image_height == 0 {
            return Err(ConfigError::Invalid {
                field: "offline".into(),
                reason: "image canvas dimensions must be greater than 0".into(),
            });
        }

        if self.static_assets.is_empty() {
            tracing::warn!("static_assets is empty; install will pre-warm nothing");
        }

        Ok(())
    }
}
