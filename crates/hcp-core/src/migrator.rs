//! Migration orchestrator
//!
//! Migrates ready candidates one at a time:
//! 1. patch the candidate's ManifestWork on the service cluster
//! 2. wait for the annotations to reach the HostedCluster on the management cluster
//!
//! A failing candidate is recorded and the batch moves on. Nothing is
//! retried except the verifier's own polling.

use crate::cancel::CancelSignal;
use crate::classifier;
use crate::error::{PatchError, StoreError, SyncError};
use crate::scanner::Scanner;
use crate::store::{ManifestStore, RecordStore};
use crate::types::{AuditEntry, Category, MigrationResult};
use crate::verifier::{SyncReport, SyncVerifier};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Progress notification emitted while a batch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent<'a> {
    /// Candidate `index` (1-based) of `total` is about to be patched
    Started {
        index: usize,
        total: usize,
        entry: &'a AuditEntry,
    },
    /// ManifestWork was patched; sync verification starts
    Patched { index: usize, entry: &'a AuditEntry },
    /// Candidate finished, successfully or not
    Finished {
        index: usize,
        total: usize,
        result: &'a MigrationResult,
    },
}

/// Ready-for-migration candidates of a management cluster, sorted by id
///
/// Per-namespace scan errors are logged and otherwise ignored.
pub async fn discover_candidates(
    scanner: &Scanner,
    mgmt_cluster_id: &str,
) -> Result<Vec<AuditEntry>, StoreError> {
    let audit = scanner.scan(mgmt_cluster_id).await?;
    for err in audit.errors() {
        warn!(namespace = %err.namespace, error = %err.error, "Skipping namespace");
    }

    let mut candidates = audit.bucket(Category::ReadyForMigration).to_vec();
    candidates.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
    info!(mgmt_cluster_id, candidates = candidates.len(), "Discovered migration candidates");
    Ok(candidates)
}

/// Sequential migration of hosted clusters
pub struct Migrator {
    records: Arc<dyn RecordStore>,
    manifests: Arc<dyn ManifestStore>,
    manifest_namespace: String,
    verifier: SyncVerifier,
}

impl Migrator {
    /// Create migrator
    ///
    /// `manifest_namespace` is the service cluster namespace holding the
    /// ManifestWorks, i.e. the management cluster's name.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        manifests: Arc<dyn ManifestStore>,
        manifest_namespace: impl Into<String>,
        verifier: SyncVerifier,
    ) -> Self {
        Self {
            records,
            manifests,
            manifest_namespace: manifest_namespace.into(),
            verifier,
        }
    }

    /// Namespace holding the ManifestWorks
    #[inline]
    #[must_use]
    pub fn manifest_namespace(&self) -> &str {
        &self.manifest_namespace
    }

    /// Verifier used for every candidate
    #[inline]
    #[must_use]
    pub fn verifier(&self) -> &SyncVerifier {
        &self.verifier
    }

    /// Migrate candidates in the given order
    pub async fn migrate(&self, candidates: &[AuditEntry], cancel: &CancelSignal) -> Vec<MigrationResult> {
        self.migrate_with_progress(candidates, cancel, |_| {}).await
    }

    /// Migrate candidates in the given order, reporting progress
    pub async fn migrate_with_progress<F>(
        &self,
        candidates: &[AuditEntry],
        cancel: &CancelSignal,
        mut on_event: F,
    ) -> Vec<MigrationResult>
    where
        F: FnMut(MigrationEvent<'_>),
    {
        let total = candidates.len();
        let mut results = Vec::with_capacity(total);

        for (i, entry) in candidates.iter().enumerate() {
            let index = i + 1;
            on_event(MigrationEvent::Started { index, total, entry });

            let result = match self.patch_step(entry, cancel).await {
                Ok(()) => {
                    on_event(MigrationEvent::Patched { index, entry });
                    self.verify_step(entry, cancel).await
                }
                Err(failed) => failed,
            };
            on_event(MigrationEvent::Finished {
                index,
                total,
                result: &result,
            });
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(total, succeeded, failed = total - succeeded, "Migration batch complete");
        results
    }

    /// Patch and verify one candidate
    pub async fn migrate_cluster(&self, entry: &AuditEntry, cancel: &CancelSignal) -> MigrationResult {
        match self.patch_step(entry, cancel).await {
            Ok(()) => self.verify_step(entry, cancel).await,
            Err(failed) => failed,
        }
    }

    async fn patch_step(&self, entry: &AuditEntry, cancel: &CancelSignal) -> Result<(), MigrationResult> {
        if cancel.is_cancelled() {
            return Err(MigrationResult::failed(
                entry,
                format!("failed to patch ManifestWork: {}", SyncError::Cancelled),
            ));
        }

        self.patch_manifest_work(&entry.cluster_id)
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(cluster_id = %entry.cluster_id, error = %e, "Failed to patch ManifestWork");
                MigrationResult::failed(entry, format!("failed to patch ManifestWork: {e}"))
            })
    }

    async fn verify_step(&self, entry: &AuditEntry, cancel: &CancelSignal) -> MigrationResult {
        match self.wait_for_sync(entry, cancel).await {
            Ok(report) => {
                info!(
                    cluster_id = %entry.cluster_id,
                    attempts = report.attempts,
                    elapsed_secs = report.elapsed.as_secs(),
                    "Migrated hosted cluster"
                );
                MigrationResult::success(entry, Utc::now())
            }
            Err(e) => {
                if e.is_cancelled() {
                    warn!(cluster_id = %entry.cluster_id, "Sync verification interrupted");
                } else {
                    error!(cluster_id = %entry.cluster_id, error = %e, "Sync verification failed");
                }
                MigrationResult::failed(entry, format!("sync verification failed: {e}"))
            }
        }
    }

    /// Write the autoscaling annotations into a hosted cluster's ManifestWork
    ///
    /// Returns the index of the rewritten manifest.
    pub async fn patch_manifest_work(&self, cluster_id: &str) -> Result<usize, PatchError> {
        let mut work = self
            .manifests
            .get_manifest_work(&self.manifest_namespace, cluster_id)
            .await
            .map_err(|source| PatchError::Fetch {
                namespace: self.manifest_namespace.clone(),
                name: cluster_id.to_string(),
                source,
            })?;

        let index = work.manifests.patch_hosted_cluster()?;
        self.manifests
            .update_manifest_work(&work)
            .await
            .map_err(PatchError::Update)?;

        info!(
            namespace = %work.namespace,
            name = %work.name,
            manifest = index,
            "Patched ManifestWork"
        );
        Ok(index)
    }

    /// Poll the management cluster until the candidate is fully configured
    pub async fn wait_for_sync(
        &self,
        entry: &AuditEntry,
        cancel: &CancelSignal,
    ) -> Result<SyncReport, SyncError> {
        let records = &self.records;
        let namespace = entry.namespace.as_str();
        let name = entry.cluster_name.as_str();

        self.verifier
            .wait_until(
                move || records.get_hosted_cluster(namespace, name),
                classifier::is_fully_configured,
                cancel,
            )
            .await
    }
}
