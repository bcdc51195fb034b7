//! Collaborator traits
//!
//! The core never talks to a cluster API directly. Three collaborators cover
//! everything it reads or writes:
//! - [`ClusterDirectory`]: resolves cluster keys (OCM ids or names)
//! - [`RecordStore`]: the management cluster (primary store), used to scan
//!   and to verify propagation
//! - [`ManifestStore`]: the service cluster (secondary store), holding the
//!   ManifestWorks that get patched
//!
//! Handles are shared across all candidates of a run and used sequentially.

use crate::error::StoreError;
use crate::manifest::ManifestWork;
use crate::types::{ClusterInfo, ClusterRecord};

/// Cluster lookup by OCM id or name
#[async_trait::async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// Resolve a cluster key
    ///
    /// # Errors
    /// `StoreError::NotFound` if no cluster has this id or name
    async fn get_cluster(&self, key: &str) -> Result<ClusterInfo, StoreError>;

    /// Check if a cluster hosts HyperShift control planes
    async fn is_management_cluster(&self, cluster_id: &str) -> Result<bool, StoreError>;
}

/// Primary store: HostedCluster records on the management cluster
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// All namespace names on the management cluster
    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;

    /// HostedClusters in one namespace
    async fn list_hosted_clusters(&self, namespace: &str) -> Result<Vec<ClusterRecord>, StoreError>;

    /// One HostedCluster, freshly read
    async fn get_hosted_cluster(&self, namespace: &str, name: &str)
        -> Result<ClusterRecord, StoreError>;
}

/// Secondary store: ManifestWorks on the service cluster
#[async_trait::async_trait]
pub trait ManifestStore: Send + Sync {
    /// Fetch one ManifestWork
    async fn get_manifest_work(&self, namespace: &str, name: &str)
        -> Result<ManifestWork, StoreError>;

    /// Replace a ManifestWork's manifests
    async fn update_manifest_work(&self, work: &ManifestWork) -> Result<(), StoreError>;
}
