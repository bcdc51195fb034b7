//! Label and annotation keys read or written on HostedCluster records.
//!
//! The annotation keys and values written by the patcher must stay byte-exact:
//! the fleet's HyperShift operator keys control-plane sizing off them.

// ============================================================================
// Labels (informational, never mutated)
// ============================================================================

/// Label mirroring the OCM cluster id of a HostedCluster
pub const CLUSTER_ID: &str = "api.openshift.com/id";

/// Label carrying the current fixed size tier of a HostedCluster
pub const HOSTED_CLUSTER_SIZE: &str = "hypershift.openshift.io/hosted-cluster-size";

// ============================================================================
// Annotations
// ============================================================================

/// Legacy fixed-size override; its presence blocks migration
pub const CLUSTER_SIZE_OVERRIDE: &str = "hypershift.openshift.io/cluster-size-override";

/// Control-plane topology annotation
pub const TOPOLOGY: &str = "hypershift.openshift.io/topology";

/// Resource-based control-plane autoscaling toggle
pub const RESOURCE_BASED_AUTOSCALING: &str =
    "hypershift.openshift.io/resource-based-cp-auto-scaling";

// ============================================================================
// Annotation values
// ============================================================================

/// Required value of [`TOPOLOGY`]
pub const TOPOLOGY_DEDICATED_REQUEST_SERVING: &str = "dedicated-request-serving-components";

/// Required value of [`RESOURCE_BASED_AUTOSCALING`]
pub const AUTOSCALING_ENABLED: &str = "true";

/// Annotations written by a migration, in the order they are displayed
pub const MIGRATION_ANNOTATIONS: [(&str, &str); 2] = [
    (TOPOLOGY, TOPOLOGY_DEDICATED_REQUEST_SERVING),
    (RESOURCE_BASED_AUTOSCALING, AUTOSCALING_ENABLED),
];

// ============================================================================
// Manifest kinds
// ============================================================================

/// Kind discriminator of the HostedCluster document inside a ManifestWork
pub const HOSTED_CLUSTER_KIND: &str = "HostedCluster";
