//! In-memory fleet
//!
//! A file-backed stand-in for the OCM directory, the management cluster and
//! the service cluster. One [`LocalFleet`] implements all three collaborator
//! traits over a [`FleetSnapshot`].
//!
//! Writes to ManifestWorks do not reach HostedCluster records by themselves;
//! [`LocalFleet::propagate`] plays the part of the agent that applies them.

use crate::error::{SnapshotError, StoreError};
use crate::labels;
use crate::manifest::ManifestWork;
use crate::store::{ClusterDirectory, ManifestStore, RecordStore};
use crate::types::{ClusterInfo, ClusterRecord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Cluster known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCluster {
    pub id: String,
    pub name: String,
    /// Hosts HyperShift control planes
    #[serde(default)]
    pub management: bool,
}

impl FleetCluster {
    /// Cluster that does not host control planes
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            management: false,
        }
    }

    /// Management cluster
    pub fn management(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            management: true,
            ..Self::new(id, name)
        }
    }
}

/// Serializable fleet state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default)]
    pub clusters: Vec<FleetCluster>,
    /// HostedCluster records on the management cluster
    #[serde(default)]
    pub hosted_clusters: Vec<ClusterRecord>,
    /// Namespaces without a HostedCluster
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// ManifestWorks on the service cluster
    #[serde(default)]
    pub manifest_works: Vec<ManifestWork>,
}

impl FleetSnapshot {
    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if is_yaml(path) {
            Ok(serde_yaml::from_str(&raw)?)
        } else {
            Ok(serde_json::from_str(&raw)?)
        }
    }

    /// Save to a file, format chosen by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let raw = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            let mut json = serde_json::to_string_pretty(self)?;
            json.push('\n');
            json
        };
        std::fs::write(path, raw).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Shared in-memory fleet
#[derive(Debug, Default)]
pub struct LocalFleet {
    state: Mutex<FleetSnapshot>,
    auto_propagate: bool,
}

impl LocalFleet {
    /// Create fleet from a snapshot
    #[must_use]
    pub fn new(snapshot: FleetSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            auto_propagate: false,
        }
    }

    /// Load fleet from a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        FleetSnapshot::load(path).map(Self::new)
    }

    /// Propagate after every ManifestWork update
    #[must_use]
    pub fn with_auto_propagation(mut self, enabled: bool) -> Self {
        self.auto_propagate = enabled;
        self
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> FleetSnapshot {
        self.state.lock().clone()
    }

    /// Apply every ManifestWork's HostedCluster annotations to its record
    ///
    /// Returns the number of records whose annotations changed.
    pub fn propagate(&self) -> usize {
        let mut state = self.state.lock();
        let FleetSnapshot {
            hosted_clusters,
            manifest_works,
            ..
        } = &mut *state;

        let mut changed = 0;
        for work in manifest_works.iter() {
            let Some(annotations) = work.hosted_cluster_annotations() else {
                continue;
            };
            for record in hosted_clusters
                .iter_mut()
                .filter(|r| r.labels.get(labels::CLUSTER_ID) == Some(&work.name))
            {
                let before = record.annotations.clone();
                record.annotations.extend(annotations.clone());
                if record.annotations != before {
                    debug!(namespace = %record.namespace, name = %record.name, "Propagated annotations");
                    changed += 1;
                }
            }
        }
        changed
    }
}

#[async_trait::async_trait]
impl ClusterDirectory for LocalFleet {
    async fn get_cluster(&self, key: &str) -> Result<ClusterInfo, StoreError> {
        self.state
            .lock()
            .clusters
            .iter()
            .find(|c| c.id == key || c.name == key)
            .map(|c| ClusterInfo {
                id: c.id.clone(),
                name: c.name.clone(),
            })
            .ok_or_else(|| StoreError::not_found("Cluster", "ocm", key))
    }

    async fn is_management_cluster(&self, cluster_id: &str) -> Result<bool, StoreError> {
        self.state
            .lock()
            .clusters
            .iter()
            .find(|c| c.id == cluster_id)
            .map(|c| c.management)
            .ok_or_else(|| StoreError::not_found("Cluster", "ocm", cluster_id))
    }
}

#[async_trait::async_trait]
impl RecordStore for LocalFleet {
    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock();
        let namespaces: BTreeSet<&str> = state
            .namespaces
            .iter()
            .map(String::as_str)
            .chain(state.hosted_clusters.iter().map(|r| r.namespace.as_str()))
            .collect();
        Ok(namespaces.into_iter().map(str::to_string).collect())
    }

    async fn list_hosted_clusters(&self, namespace: &str) -> Result<Vec<ClusterRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .hosted_clusters
            .iter()
            .filter(|r| r.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn get_hosted_cluster(&self, namespace: &str, name: &str) -> Result<ClusterRecord, StoreError> {
        self.state
            .lock()
            .hosted_clusters
            .iter()
            .find(|r| r.namespace == namespace && r.name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(labels::HOSTED_CLUSTER_KIND, namespace, name))
    }
}

#[async_trait::async_trait]
impl ManifestStore for LocalFleet {
    async fn get_manifest_work(&self, namespace: &str, name: &str) -> Result<ManifestWork, StoreError> {
        self.state
            .lock()
            .manifest_works
            .iter()
            .find(|w| w.namespace == namespace && w.name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("ManifestWork", namespace, name))
    }

    async fn update_manifest_work(&self, work: &ManifestWork) -> Result<(), StoreError> {
        {
            let mut state = self.state.lock();
            let slot = state
                .manifest_works
                .iter_mut()
                .find(|w| w.namespace == work.namespace && w.name == work.name)
                .ok_or_else(|| StoreError::not_found("ManifestWork", &work.namespace, &work.name))?;
            slot.manifests = work.manifests.clone();
        }

        if self.auto_propagate {
            self.propagate();
        }
        Ok(())
    }
}
