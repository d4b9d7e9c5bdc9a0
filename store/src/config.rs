//! Store configuration.
//!
//! Settings come from an optional TOML file and are then overlaid by
//! environment variables:
//!
//! | Variable                | Field            |
//! |-------------------------|------------------|
//! | `QUIVER_USER`           | `user`           |
//! | `QUIVER_LOG`            | `log_filter`     |
//! | `QUIVER_MAX_BATCH_SIZE` | `max_batch_size` |
//!
//! Invalid environment values are logged and ignored.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{StoreError, StoreResult};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Principal recorded as creator and modifier of entities.
    pub user: String,
    /// Upper bound on entities per mutation call.
    pub max_batch_size: usize,
    /// Default `tracing` filter directive.
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            user: quiver_mutation::DEFAULT_USER.to_string(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            log_filter: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parse settings from TOML text. Absent fields keep their defaults.
    pub fn from_toml_str(contents: &str) -> StoreResult<Self> {
        toml::from_str(contents).map_err(|e| StoreError::config(format!("failed to parse config: {e}")))
    }

    /// Load settings from `path` (defaults if the file does not exist),
    /// then apply environment overrides.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| StoreError::config(format!("failed to read {}: {e}", path.display())))?;
            toml::from_str(&contents)
                .map_err(|e| StoreError::config(format!("failed to parse {}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay settings from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Overlay settings from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("QUIVER_USER") {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                tracing::warn!("empty QUIVER_USER, ignoring");
            } else {
                self.user = trimmed.to_string();
            }
        }

        if let Some(raw) = lookup("QUIVER_LOG") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.log_filter = trimmed.to_string();
            }
        }

        if let Some(raw) = lookup("QUIVER_MAX_BATCH_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(0) => tracing::warn!("QUIVER_MAX_BATCH_SIZE must be positive, ignoring"),
                Ok(value) => self.max_batch_size = value,
                Err(err) => tracing::warn!("invalid QUIVER_MAX_BATCH_SIZE, ignoring: {err}"),
            }
        }
    }
}
