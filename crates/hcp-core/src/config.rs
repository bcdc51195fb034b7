//! Migration configuration
//!
//! Defaults reproduce the fleet's conventions: `ocm-production-*` and
//! `ocm-staging-*` namespaces, a 15 s poll cadence and a 5 min sync deadline.
//! Any value can be overridden from a TOML file.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted sync deadline (one day)
pub const MAX_SYNC_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Seconds between sync verification polls
    pub poll_interval_secs: u64,
    /// Seconds before sync verification gives up
    pub sync_timeout_secs: u64,
    /// Namespace prefix of hosted cluster namespaces
    pub namespace_prefix: String,
    /// Environments whose namespaces are scanned
    pub environments: Vec<String>,
    /// Reason recorded when elevating on the service cluster
    pub elevation_reason: String,
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse from TOML text and validate
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// With poll interval, rounded up to whole seconds
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = whole_secs(interval);
        self
    }

    /// With sync timeout, rounded up to whole seconds
    #[inline]
    #[must_use]
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout_secs = whole_secs(timeout);
        self
    }

    /// With namespace prefix
    #[inline]
    #[must_use]
    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = prefix.into();
        self
    }

    /// Poll cadence
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Sync deadline
    #[inline]
    #[must_use]
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Check values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be positive".into()));
        }
        if self.sync_timeout_secs > MAX_SYNC_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "sync_timeout_secs ({}) exceeds the maximum of {MAX_SYNC_TIMEOUT_SECS}",
                self.sync_timeout_secs
            )));
        }
        if self.sync_timeout_secs < self.poll_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "sync_timeout_secs ({}) is shorter than one poll interval ({})",
                self.sync_timeout_secs, self.poll_interval_secs
            )));
        }
        if self.namespace_prefix.is_empty() {
            return Err(ConfigError::Invalid("namespace_prefix must not be empty".into()));
        }
        if self.environments.is_empty() || self.environments.iter().any(String::is_empty) {
            return Err(ConfigError::Invalid(
                "environments must list at least one non-empty name".into(),
            ));
        }
        Ok(())
    }

    /// Build the namespace pattern `^<prefix>-(<env>|…)-[A-Za-z0-9]+$`
    pub fn namespace_pattern(&self) -> Result<Regex, ConfigError> {
        let envs: Vec<String> = self.environments.iter().map(|e| regex::escape(e)).collect();
        let pattern = format!(
            "^{}-({})-[A-Za-z0-9]+$",
            regex::escape(&self.namespace_prefix),
            envs.join("|")
        );
        Regex::new(&pattern).map_err(|e| ConfigError::Invalid(format!("namespace pattern: {e}")))
    }
}

fn whole_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            sync_timeout_secs: 300,
            namespace_prefix: "ocm".to_string(),
            environments: vec!["production".to_string(), "staging".to_string()],
            elevation_reason: "SREP-2821 - Migrating hosted clusters to node autoscaling"
                .to_string(),
        }
    }
}
