//! Testing utilities for HCP workspace
//!
//! Shared record builders, manifest builders and fleet fixtures.

#![allow(missing_docs)]

use hcp_core::labels;
use hcp_core::{
    ClusterRecord, FleetCluster, FleetSnapshot, LocalFleet, ManifestSet, ManifestWork,
    RawManifest,
};
use serde_json::{json, Value};

pub const MGMT_CLUSTER_ID: &str = "2mgmt0000000000000000000000000001";
pub const MGMT_CLUSTER_NAME: &str = "hs-mc-test";
pub const SVC_CLUSTER_ID: &str = "2svc00000000000000000000000000001";
pub const SVC_CLUSTER_NAME: &str = "hs-sc-test";

/// Namespace a hosted cluster with this id lives in
pub fn namespace_for(id: &str) -> String {
    format!("ocm-production-{id}")
}

/// Record with id and size labels and no annotations
pub fn record(id: &str) -> ClusterRecord {
    ClusterRecord::new(namespace_for(id), format!("hc-{id}"))
        .with_label(labels::CLUSTER_ID, id)
        .with_label(labels::HOSTED_CLUSTER_SIZE, "m54xl")
}

/// Record carrying the legacy size override
pub fn override_record(id: &str) -> ClusterRecord {
    record(id).with_annotation(labels::CLUSTER_SIZE_OVERRIDE, "large")
}

/// Record already carrying both autoscaling annotations
pub fn configured_record(id: &str) -> ClusterRecord {
    labels::MIGRATION_ANNOTATIONS
        .iter()
        .fold(record(id), |r, (k, v)| r.with_annotation(*k, *v))
}

/// HostedCluster manifest with the given annotations
pub fn hosted_cluster_manifest(name: &str, annotations: Value) -> RawManifest {
    manifest(json!({
        "apiVersion": "hypershift.openshift.io/v1beta1",
        "kind": "HostedCluster",
        "metadata": {
            "name": name,
            "annotations": annotations,
        },
        "spec": {"release": {"image": "quay.io/openshift-release-dev/ocp-release:4.17.0"}}
    }))
}

/// Secret manifest that must pass through untouched
pub fn secret_manifest(name: &str) -> RawManifest {
    manifest(json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": name},
        "data": {"pull-secret": "e30="}
    }))
}

fn manifest(value: Value) -> RawManifest {
    RawManifest::from_value(&value).unwrap()
}

/// ManifestWork mirroring a record: a pull secret followed by its HostedCluster
pub fn manifest_work_for(record: &ClusterRecord) -> ManifestWork {
    let annotations: serde_json::Map<String, Value> = record
        .annotations
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    ManifestWork::new(
        MGMT_CLUSTER_NAME,
        record.cluster_id(),
        ManifestSet::new(vec![
            secret_manifest("pull-secret"),
            hosted_cluster_manifest(&record.name, Value::Object(annotations)),
        ]),
    )
}

/// Snapshot with the test management and service clusters
pub fn snapshot_with(records: Vec<ClusterRecord>) -> FleetSnapshot {
    let manifest_works = records.iter().map(manifest_work_for).collect();
    FleetSnapshot {
        clusters: vec![
            FleetCluster::management(MGMT_CLUSTER_ID, MGMT_CLUSTER_NAME),
            FleetCluster::new(SVC_CLUSTER_ID, SVC_CLUSTER_NAME),
        ],
        hosted_clusters: records,
        namespaces: vec![
            "default".to_string(),
            "hypershift".to_string(),
            "ocm-production-".to_string(),
        ],
        manifest_works,
    }
}

/// Six resolvable clusters: 2 overridden, 3 ready, 1 configured
pub fn mixed_snapshot() -> FleetSnapshot {
    snapshot_with(vec![
        override_record("ovr1"),
        override_record("ovr2"),
        record("rdy1"),
        record("rdy2"),
        record("rdy3"),
        configured_record("cfg1"),
    ])
}

/// Fleet that propagates ManifestWork updates immediately
pub fn propagating_fleet(snapshot: FleetSnapshot) -> LocalFleet {
    LocalFleet::new(snapshot).with_auto_propagation(true)
}
