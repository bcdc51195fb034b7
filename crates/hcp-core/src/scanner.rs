//! Candidate scanner
//!
//! Walks every namespace on the management cluster, keeps the ones matching
//! the hosted cluster naming convention, resolves each to its single
//! HostedCluster and buckets it by category. A namespace that fails to
//! resolve is recorded in the result and the scan moves on.

use crate::classifier;
use crate::config::MigrationConfig;
use crate::error::{ConfigError, ScanError, StoreError};
use crate::store::RecordStore;
use crate::types::{AuditEntry, AuditError, AuditResult, ClusterRecord};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hosted cluster namespace filter
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    pattern: Regex,
}

impl NamespaceFilter {
    /// Build filter from configuration
    pub fn from_config(config: &MigrationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: config.namespace_pattern()?,
        })
    }

    /// Check if a namespace holds a hosted cluster
    #[inline]
    #[must_use]
    pub fn matches(&self, namespace: &str) -> bool {
        self.pattern.is_match(namespace)
    }

    /// Keep matching namespaces, preserving order
    pub fn filter<I>(&self, namespaces: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        namespaces.into_iter().filter(|ns| self.matches(ns)).collect()
    }

    /// Underlying pattern
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Scans a management cluster for migration candidates
pub struct Scanner {
    records: Arc<dyn RecordStore>,
    filter: NamespaceFilter,
}

impl Scanner {
    /// Create scanner
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>, filter: NamespaceFilter) -> Self {
        Self { records, filter }
    }

    /// Namespaces matching the filter
    pub async fn matching_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let all = self.records.list_namespaces().await?;
        let total = all.len();
        let matching = self.filter.filter(all);
        debug!(total, matching = matching.len(), "Filtered namespaces");
        Ok(matching)
    }

    /// Resolve a namespace to its single HostedCluster
    ///
    /// # Errors
    /// - `ScanError::NotFound` if the namespace holds none
    /// - `ScanError::Ambiguous` if it holds more than one
    pub async fn resolve(&self, namespace: &str) -> Result<ClusterRecord, ScanError> {
        let mut records = self.records.list_hosted_clusters(namespace).await?;
        match records.len() {
            0 => Err(ScanError::NotFound),
            1 => Ok(records.remove(0)),
            found => Err(ScanError::Ambiguous { found }),
        }
    }

    /// Resolve and classify one namespace
    pub async fn audit_namespace(&self, namespace: &str) -> Result<AuditEntry, ScanError> {
        let record = self.resolve(namespace).await?;
        let category = classifier::classify(&record);
        debug!(namespace, cluster_id = record.cluster_id(), %category, "Classified hosted cluster");
        Ok(AuditEntry::from_record(namespace, &record, category))
    }

    /// Scan every matching namespace
    ///
    /// Only a failure to list namespaces aborts the scan.
    pub async fn scan(&self, mgmt_cluster_id: &str) -> Result<AuditResult, StoreError> {
        let namespaces = self.matching_namespaces().await?;

        let mut entries = Vec::with_capacity(namespaces.len());
        let mut errors = Vec::new();

        for namespace in &namespaces {
            match self.audit_namespace(namespace).await {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Failed to resolve hosted cluster");
                    errors.push(AuditError::new(namespace, e));
                }
            }
        }

        let result = AuditResult::new(mgmt_cluster_id, entries, errors);
        info!(
            mgmt_cluster_id,
            total_scanned = result.total_scanned(),
            errors = result.errors().len(),
            "Scan complete"
        );
        Ok(result)
    }
}
