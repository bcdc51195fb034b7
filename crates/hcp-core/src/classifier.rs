//! Migration category rules
//!
//! First match wins:
//! 1. override annotation present (any value) → `needs-removal`
//! 2. topology and autoscaling annotations both correct → `already-configured`
//! 3. anything else → `ready-for-migration`
//!
//! Rule 2 is [`is_fully_configured`], which is also the sync verifier's
//! success condition.

use crate::labels;
use crate::types::{Category, ClusterRecord, Metadata};

/// Classify a record from its annotations
#[must_use]
pub fn classify(record: &ClusterRecord) -> Category {
    classify_annotations(&record.annotations)
}

/// Classify a bare annotation map
#[must_use]
pub fn classify_annotations(annotations: &Metadata) -> Category {
    if annotations.contains_key(labels::CLUSTER_SIZE_OVERRIDE) {
        return Category::NeedsRemoval;
    }

    if has_required_annotations(annotations) {
        return Category::AlreadyConfigured;
    }

    Category::ReadyForMigration
}

/// Check if a record already carries both autoscaling annotations
#[inline]
#[must_use]
pub fn is_fully_configured(record: &ClusterRecord) -> bool {
    has_required_annotations(&record.annotations)
}

/// Exact, case-sensitive comparison; missing keys are simply unsatisfied.
#[must_use]
pub fn has_required_annotations(annotations: &Metadata) -> bool {
    labels::MIGRATION_ANNOTATIONS
        .iter()
        .all(|(key, value)| annotations.get(*key).is_some_and(|v| v == value))
}
