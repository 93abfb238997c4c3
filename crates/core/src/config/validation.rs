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

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `app_origin` is not an absolute http(s) URL
    /// - a manifest entry is not root-relative
    /// - region names are empty or not distinct
    /// - `regions.tile_limit` is 0
    ///
    /// Returns `ConfigError::Missing` if the manifest is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
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

        self.origin_url()?;

        if self.manifest.is_empty() {
            return Err(ConfigError::Missing {
                field: "manifest".into(),
                hint: "list at least the root document, e.g. manifest = [\"/app/\"]".into(),
            });
        }
        if let Some(entry) = self.manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "manifest".into(),
                reason: format!("{entry} is not root-relative"),
            });
        }

        if self.install_attempts == 0 {
            return Err(ConfigError::Invalid { field: "install_attempts".into(), reason: "must be at least 1".into() });
        }

        let names = self.region_set();
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid { field: "regions".into(), reason: "names must not be empty".into() });
        }
        if names.iter().collect::<HashSet<_>>().len() != names.len() {
            return Err(ConfigError::Invalid { field: "regions".into(), reason: "names must be distinct".into() });
        }

        if self.regions.tile_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "regions.tile_limit".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if let Some(doc) = &self.offline_document
            && !self.manifest.contains(doc)
        {
            tracing::warn!(
                offline_document = %doc,
                "offline_document is not in the manifest; it will only be available once fetched"
            );
        }

        Ok(())
    }
}
