//! Run preconditions
//!
//! Anything failing here means the run targets the wrong cluster, so the
//! errors abort the whole run instead of being collected per candidate.

use crate::error::{SetupError, StoreError};
use crate::store::ClusterDirectory;
use crate::types::ClusterInfo;

/// Longest accepted cluster key
pub const MAX_CLUSTER_KEY_LEN: usize = 256;

/// Check a cluster key is a plausible OCM id or name
///
/// # Errors
/// `SetupError::InvalidClusterKey` for empty, overlong or non `[A-Za-z0-9_-]` keys
pub fn validate_cluster_key(key: &str) -> Result<(), SetupError> {
    let starts_alphanumeric = key.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if starts_alphanumeric && valid_chars && key.len() <= MAX_CLUSTER_KEY_LEN {
        Ok(())
    } else {
        Err(SetupError::InvalidClusterKey(key.to_string()))
    }
}

/// Validate and resolve a cluster key
pub async fn resolve_cluster(
    directory: &dyn ClusterDirectory,
    key: &str,
) -> Result<ClusterInfo, SetupError> {
    validate_cluster_key(key)?;
    match directory.get_cluster(key).await {
        Ok(info) => Ok(info),
        Err(StoreError::NotFound { .. }) => Err(SetupError::ClusterNotFound(key.to_string())),
        Err(e) => Err(SetupError::Store(e)),
    }
}

/// Validate and resolve a cluster key that must name a management cluster
pub async fn resolve_management_cluster(
    directory: &dyn ClusterDirectory,
    key: &str,
) -> Result<ClusterInfo, SetupError> {
    let info = resolve_cluster(directory, key).await?;
    if !directory.is_management_cluster(&info.id).await? {
        return Err(SetupError::NotManagementCluster(info.id));
    }
    tracing::debug!(cluster_id = %info.id, cluster_name = %info.name, "Resolved management cluster");
    Ok(info)
}
