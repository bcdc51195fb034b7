//! Core types for HCP
//!
//! Defines the fundamental types for audits and migrations:
//! - Hosted cluster records and their metadata
//! - Migration categories
//! - Audit snapshots and per-namespace errors
//! - Per-candidate migration outcomes

use crate::labels;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// String-to-string metadata map (labels or annotations)
pub type Metadata = BTreeMap<String, String>;

/// A HostedCluster as seen on the management cluster
///
/// Read-only in this crate: annotations only change through ManifestWork
/// propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Namespace holding the record
    pub namespace: String,
    /// Record name, unique within its namespace
    pub name: String,
    /// Informational labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Metadata,
    /// Annotations (the only mutation target)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Metadata,
}

impl ClusterRecord {
    /// Create new record with empty metadata
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Metadata::new(),
            annotations: Metadata::new(),
        }
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// With annotation
    #[inline]
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// OCM cluster id mirrored in the labels, empty when absent
    #[inline]
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        self.labels.get(labels::CLUSTER_ID).map_or("", String::as_str)
    }

    /// Current size tier, empty when absent
    #[inline]
    #[must_use]
    pub fn current_size(&self) -> &str {
        self.labels
            .get(labels::HOSTED_CLUSTER_SIZE)
            .map_or("", String::as_str)
    }
}

/// Migration category of a hosted cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Carries the legacy size override; must be cleaned up by hand first
    NeedsRemoval,
    /// Can be migrated right away
    ReadyForMigration,
    /// Already has the autoscaling annotations
    AlreadyConfigured,
}

impl Category {
    /// All categories in bucket order
    pub const ALL: [Category; 3] = [
        Category::NeedsRemoval,
        Category::ReadyForMigration,
        Category::AlreadyConfigured,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NeedsRemoval => "needs-removal",
            Category::ReadyForMigration => "ready-for-migration",
            Category::AlreadyConfigured => "already-configured",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Audit information for one hosted cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub cluster_id: String,
    pub cluster_name: String,
    pub namespace: String,
    pub current_size: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Metadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Metadata,
}

impl AuditEntry {
    /// Build entry from a resolved record and its category
    #[must_use]
    pub fn from_record(namespace: impl Into<String>, record: &ClusterRecord, category: Category) -> Self {
        Self {
            cluster_id: record.cluster_id().to_string(),
            cluster_name: record.name.clone(),
            namespace: namespace.into(),
            current_size: record.current_size().to_string(),
            category,
            labels: record.labels.clone(),
            annotations: record.annotations.clone(),
        }
    }
}

/// Per-namespace scan failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditError {
    pub namespace: String,
    pub error: String,
}

impl AuditError {
    /// Create new audit error
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            namespace: namespace.into(),
            error: error.to_string(),
        }
    }
}

/// Category filter accepted by the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowOnly {
    /// Only clusters carrying the override annotation
    NeedsRemoval,
    /// Only clusters ready to migrate
    ReadyForMigration,
}

impl ShowOnly {
    /// Category selected by this filter
    #[inline]
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            ShowOnly::NeedsRemoval => Category::NeedsRemoval,
            ShowOnly::ReadyForMigration => Category::ReadyForMigration,
        }
    }
}

impl FromStr for ShowOnly {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "needs-removal" => Ok(ShowOnly::NeedsRemoval),
            "ready-for-migration" => Ok(ShowOnly::ReadyForMigration),
            other => Err(format!(
                "invalid show-only filter '{other}'. Valid options: needs-removal, ready-for-migration"
            )),
        }
    }
}

/// Immutable audit snapshot of one management cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    mgmt_cluster_id: String,
    total_scanned: usize,
    needs_label_removal: Vec<AuditEntry>,
    ready_for_migration: Vec<AuditEntry>,
    already_configured: Vec<AuditEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<AuditError>,
}

impl AuditResult {
    /// Bucket classified entries and count them
    ///
    /// `total_scanned` counts classified entries only, never errors.
    #[must_use]
    pub fn new(
        mgmt_cluster_id: impl Into<String>,
        entries: impl IntoIterator<Item = AuditEntry>,
        errors: Vec<AuditError>,
    ) -> Self {
        let mut needs_label_removal = Vec::new();
        let mut ready_for_migration = Vec::new();
        let mut already_configured = Vec::new();

        for entry in entries {
            match entry.category {
                Category::NeedsRemoval => needs_label_removal.push(entry),
                Category::ReadyForMigration => ready_for_migration.push(entry),
                Category::AlreadyConfigured => already_configured.push(entry),
            }
        }

        let total_scanned =
            needs_label_removal.len() + ready_for_migration.len() + already_configured.len();

        Self {
            mgmt_cluster_id: mgmt_cluster_id.into(),
            total_scanned,
            needs_label_removal,
            ready_for_migration,
            already_configured,
            errors,
        }
    }

    /// Keep only the bucket selected by `filter`
    ///
    /// `total_scanned` becomes that bucket's size; errors are preserved.
    #[must_use]
    pub fn filtered(self, filter: ShowOnly) -> Self {
        let (needs_label_removal, ready_for_migration) = match filter {
            ShowOnly::NeedsRemoval => (self.needs_label_removal, Vec::new()),
            ShowOnly::ReadyForMigration => (Vec::new(), self.ready_for_migration),
        };

        Self {
            mgmt_cluster_id: self.mgmt_cluster_id,
            total_scanned: needs_label_removal.len() + ready_for_migration.len(),
            needs_label_removal,
            ready_for_migration,
            already_configured: Vec::new(),
            errors: self.errors,
        }
    }

    /// Management cluster the audit ran against
    #[inline]
    #[must_use]
    pub fn mgmt_cluster_id(&self) -> &str {
        &self.mgmt_cluster_id
    }

    /// Number of classified entries
    #[inline]
    #[must_use]
    pub fn total_scanned(&self) -> usize {
        self.total_scanned
    }

    /// Entries in one bucket, in scan order
    #[must_use]
    pub fn bucket(&self, category: Category) -> &[AuditEntry] {
        match category {
            Category::NeedsRemoval => &self.needs_label_removal,
            Category::ReadyForMigration => &self.ready_for_migration,
            Category::AlreadyConfigured => &self.already_configured,
        }
    }

    /// Entries across all buckets in bucket order
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        Category::ALL.into_iter().flat_map(|c| self.bucket(c).iter())
    }

    /// Per-namespace scan failures
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[AuditError] {
        &self.errors
    }
}

/// Outcome of one migration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Success,
    Failed,
}

/// Per-candidate migration result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub cluster_id: String,
    pub cluster_name: String,
    pub status: MigrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl MigrationResult {
    /// Successful migration verified at `verified_at`
    #[must_use]
    pub fn success(entry: &AuditEntry, verified_at: DateTime<Utc>) -> Self {
        Self {
            cluster_id: entry.cluster_id.clone(),
            cluster_name: entry.cluster_name.clone(),
            status: MigrationStatus::Success,
            error: None,
            verified_at: Some(verified_at),
        }
    }

    /// Failed migration with a reason
    #[must_use]
    pub fn failed(entry: &AuditEntry, error: impl Into<String>) -> Self {
        Self {
            cluster_id: entry.cluster_id.clone(),
            cluster_name: entry.cluster_name.clone(),
            status: MigrationStatus::Failed,
            error: Some(error.into()),
            verified_at: None,
        }
    }

    /// Check if migration succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == MigrationStatus::Success
    }
}

/// Cluster resolved from an OCM id or name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, category: Category) -> AuditEntry {
        let record = ClusterRecord::new(format!("ocm-production-{id}"), format!("hc-{id}"))
            .with_label(labels::CLUSTER_ID, id);
        AuditEntry::from_record(record.namespace.clone(), &record, category)
    }

    #[test]
    fn record_identity_from_labels() {
        let record = ClusterRecord::new("ns", "demo")
            .with_label(labels::CLUSTER_ID, "abc123")
            .with_label(labels::HOSTED_CLUSTER_SIZE, "large");
        assert_eq!(record.cluster_id(), "abc123");
        assert_eq!(record.current_size(), "large");

        let bare = ClusterRecord::new("ns", "demo");
        assert_eq!(bare.cluster_id(), "");
        assert_eq!(bare.current_size(), "");
    }

    #[test]
    fn category_wire_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
        assert!("Needs-Removal".parse::<Category>().is_err());
    }

    #[test]
    fn show_only_rejects_already_configured() {
        assert_eq!("needs-removal".parse::<ShowOnly>().unwrap(), ShowOnly::NeedsRemoval);
        assert!("already-configured".parse::<ShowOnly>().is_err());
    }

    #[test]
    fn audit_result_counts_buckets_not_errors() {
        let result = AuditResult::new(
            "mgmt-1",
            vec![
                entry("a", Category::NeedsRemoval),
                entry("b", Category::ReadyForMigration),
                entry("c", Category::ReadyForMigration),
            ],
            vec![AuditError::new("ocm-staging-x", "no HostedCluster found")],
        );
        assert_eq!(result.total_scanned(), 3);
        assert_eq!(result.bucket(Category::ReadyForMigration).len(), 2);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.entries().count(), 3);
    }

    #[test]
    fn filtered_keeps_one_bucket_and_errors() {
        let result = AuditResult::new(
            "mgmt-1",
            vec![
                entry("a", Category::NeedsRemoval),
                entry("b", Category::ReadyForMigration),
                entry("c", Category::AlreadyConfigured),
            ],
            vec![AuditError::new("ocm-staging-x", "boom")],
        );

        let filtered = result.filtered(ShowOnly::NeedsRemoval);
        assert_eq!(filtered.total_scanned(), 1);
        assert_eq!(filtered.bucket(Category::NeedsRemoval).len(), 1);
        assert!(filtered.bucket(Category::ReadyForMigration).is_empty());
        assert!(filtered.bucket(Category::AlreadyConfigured).is_empty());
        assert_eq!(filtered.errors().len(), 1);
        assert_eq!(filtered.mgmt_cluster_id(), "mgmt-1");
    }

    #[test]
    fn audit_result_json_shape() {
        let result = AuditResult::new("mgmt-1", vec![entry("a", Category::ReadyForMigration)], vec![]);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["mgmt_cluster_id"], "mgmt-1");
        assert_eq!(value["total_scanned"], 1);
        assert_eq!(value["needs_label_removal"], serde_json::json!([]));
        assert_eq!(value["ready_for_migration"][0]["cluster_id"], "a");
        assert_eq!(value["ready_for_migration"][0]["category"], "ready-for-migration");
        assert!(value["ready_for_migration"][0].get("annotations").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn migration_result_shape() {
        let e = entry("a", Category::ReadyForMigration);
        let failed = MigrationResult::failed(&e, "boom");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "boom");
        assert!(value.get("verified_at").is_none());

        let ok = MigrationResult::success(&e, Utc::now());
        assert!(ok.is_success());
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value.get("error").is_none());
        assert!(value["verified_at"].is_string());
    }
}
