//! Error types for HCP Core
//!
//! Provides error handling for:
//! - Collaborator (store) failures
//! - Per-namespace resolution failures during a scan
//! - ManifestWork patch failures
//! - Sync verification failures
//! - Setup and precondition failures that abort a whole run

use std::time::Duration;

/// Collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Requested object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Write rejected because the object changed underneath
    #[error("conflict updating {0}")]
    Conflict(String),

    /// Backend failure (connection, permissions, decoding)
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// Create not-found error
    pub fn not_found(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Per-namespace resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Namespace holds no HostedCluster
    #[error("no HostedCluster found")]
    NotFound,

    /// Namespace holds more than one HostedCluster
    #[error("found {found} HostedClusters, expected 1")]
    Ambiguous { found: usize },

    /// Listing HostedClusters failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// ManifestWork patch failures
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// No manifest decoded with kind HostedCluster
    #[error("HostedCluster not found in ManifestWork manifests")]
    HostedClusterNotFound,

    /// Modified manifest could not be re-serialized
    #[error("failed to marshal modified manifest: {0}")]
    Encode(#[source] serde_json::Error),

    /// ManifestWork could not be fetched
    #[error("failed to get ManifestWork {namespace}/{name}: {source}")]
    Fetch {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    /// ManifestWork could not be written back
    #[error("failed to update ManifestWork: {0}")]
    Update(#[source] StoreError),
}

/// Sync verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Deadline passed without observing the required annotations
    #[error(
        "timeout: annotations did not sync after {secs}s ({attempts} attempts){suffix}",
        secs = .timeout.as_secs(),
        suffix = last_error_suffix(.last_error)
    )]
    TimedOut {
        timeout: Duration,
        attempts: u32,
        last_error: Option<String>,
    },

    /// Run-wide cancellation observed
    #[error("context cancelled")]
    Cancelled,

    /// Poll interval and timeout do not fit on the clock
    #[error(
        "sync schedule out of range (poll interval {poll}ms, timeout {secs}s)",
        poll = .poll_interval.as_millis(),
        secs = .timeout.as_secs()
    )]
    OutOfRange {
        poll_interval: Duration,
        timeout: Duration,
    },
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(", last error: {e}"))
        .unwrap_or_default()
}

impl SyncError {
    /// Check if verification was interrupted rather than exhausted
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Setup and precondition failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// Cluster key is not a valid id or name
    #[error("invalid cluster key '{0}': expected 1-256 characters of [A-Za-z0-9_-] starting with a letter or digit")]
    InvalidClusterKey(String),

    /// Cluster could not be resolved from its key
    #[error("cluster '{0}' not found")]
    ClusterNotFound(String),

    /// Cluster is not a management cluster
    #[error("cluster {0} is not a management cluster")]
    NotManagementCluster(String),

    /// Directory lookup failed
    #[error("failed to resolve cluster: {0}")]
    Store(#[from] StoreError),
}

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config values are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fleet snapshot file failures
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// File could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_messages_match_fleet_conventions() {
        assert_eq!(ScanError::NotFound.to_string(), "no HostedCluster found");
        assert_eq!(
            ScanError::Ambiguous { found: 3 }.to_string(),
            "found 3 HostedClusters, expected 1"
        );
    }

    #[test]
    fn sync_timeout_mentions_last_error() {
        let err = SyncError::TimedOut {
            timeout: Duration::from_secs(300),
            attempts: 20,
            last_error: Some("connection refused".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("300s"));
        assert!(msg.contains("20 attempts"));
        assert!(msg.contains("connection refused"));

        let quiet = SyncError::TimedOut {
            timeout: Duration::from_secs(60),
            attempts: 4,
            last_error: None,
        };
        assert!(!quiet.to_string().contains("last error"));
    }

    #[test]
    fn cancelled_is_distinct_from_timeout() {
        assert!(SyncError::Cancelled.is_cancelled());
        assert_ne!(SyncError::Cancelled.to_string(), "timeout");
    }

    #[test]
    fn out_of_range_reports_schedule() {
        let err = SyncError::OutOfRange {
            poll_interval: Duration::from_secs(15),
            timeout: Duration::MAX,
        };
        assert!(!err.is_cancelled());
        assert!(err.to_string().starts_with("sync schedule out of range (poll interval 15000ms"));
    }

    #[test]
    fn store_not_found_display() {
        let err = StoreError::not_found("HostedCluster", "ocm-production-abc", "demo");
        assert_eq!(err.to_string(), "HostedCluster ocm-production-abc/demo not found");
    }
}
