//! HCP Core - hosted control plane autoscaling migration
//!
//! The engine that:
//! - Classifies HostedClusters by their sizing annotations
//! - Scans a management cluster for migration candidates
//! - Patches the HostedCluster manifest inside a ManifestWork
//! - Verifies the patch propagates back to the management cluster
//! - Migrates candidates one by one, isolating failures
//!
//! # Example
//!
//! ```rust,ignore
//! use hcp_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fleet = Arc::new(LocalFleet::load("fleet.json")?);
//! let config = MigrationConfig::new();
//! let scanner = Scanner::new(fleet.clone(), NamespaceFilter::from_config(&config)?);
//!
//! let candidates = discover_candidates(&scanner, "mgmt-cluster-id").await?;
//! let migrator = Migrator::new(fleet.clone(), fleet, "hs-mc-1", SyncVerifier::from_config(&config));
//! let results = migrator.migrate(&candidates, &CancelSignal::never()).await;
//!
//! println!("Migrated {} clusters", results.iter().filter(|r| r.is_success()).count());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod cancel;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fleet;
pub mod labels;
pub mod manifest;
pub mod migrator;
pub mod scanner;
pub mod setup;
pub mod store;
pub mod types;
pub mod verifier;

// Re-exports for convenience
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use classifier::{classify, classify_annotations, is_fully_configured};
pub use config::MigrationConfig;
pub use error::{
    ConfigError, PatchError, ScanError, SetupError, SnapshotError, StoreError, SyncError,
};
pub use fleet::{FleetCluster, FleetSnapshot, LocalFleet};
pub use manifest::{ManifestSet, ManifestWork, RawManifest};
pub use migrator::{discover_candidates, MigrationEvent, Migrator};
pub use scanner::{NamespaceFilter, Scanner};
pub use setup::{resolve_cluster, resolve_management_cluster, validate_cluster_key};
pub use store::{ClusterDirectory, ManifestStore, RecordStore};
pub use types::{
    AuditEntry, AuditError, AuditResult, Category, ClusterInfo, ClusterRecord, Metadata,
    MigrationResult, MigrationStatus, ShowOnly,
};
pub use verifier::{SyncReport, SyncVerifier};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with HCP Core
    pub use crate::{
        discover_candidates, AuditResult, CancelSignal, Category, ClusterRecord, LocalFleet,
        MigrationConfig, MigrationResult, Migrator, NamespaceFilter, Scanner, ShowOnly,
        SyncVerifier,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
