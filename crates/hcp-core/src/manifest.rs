//! ManifestWork documents and the HostedCluster patch
//!
//! A ManifestWork carries an ordered list of opaque serialized manifests.
//! Only the HostedCluster document is ever decoded for writing; every other
//! manifest is passed through as the exact bytes it arrived with.

use crate::error::PatchError;
use crate::labels;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One opaque serialized manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest(Vec<u8>);

impl RawManifest {
    /// Wrap raw bytes
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Encode a JSON document
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(Self)
    }

    /// Raw bytes as stored
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode as a generic JSON object, `None` if malformed or not an object
    #[must_use]
    pub fn decode(&self) -> Option<Map<String, Value>> {
        match serde_json::from_slice(&self.0) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Kind discriminator, if the manifest decodes
    #[must_use]
    pub fn kind(&self) -> Option<String> {
        self.decode()?
            .get("kind")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

// Snapshot files embed well-formed manifests as documents; anything that does
// not decode is kept as a string holding the original text.
impl Serialize for RawManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match serde_json::from_slice::<Value>(&self.0) {
            Ok(value) if !value.is_string() => value.serialize(serializer),
            _ => serializer.serialize_str(&String::from_utf8_lossy(&self.0)),
        }
    }
}

impl<'de> Deserialize<'de> for RawManifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Self(text.into_bytes())),
            value => serde_json::to_vec(&value)
                .map(Self)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Ordered manifests of one ManifestWork
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestSet(Vec<RawManifest>);

impl ManifestSet {
    /// Create from manifests
    #[inline]
    #[must_use]
    pub fn new(manifests: Vec<RawManifest>) -> Self {
        Self(manifests)
    }

    /// Manifests in order
    #[inline]
    #[must_use]
    pub fn manifests(&self) -> &[RawManifest] {
        &self.0
    }

    /// Number of manifests
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index and decoded body of the first HostedCluster manifest
    #[must_use]
    pub fn find_hosted_cluster(&self) -> Option<(usize, Map<String, Value>)> {
        self.0.iter().enumerate().find_map(|(index, manifest)| {
            let doc = manifest.decode()?;
            let is_hosted_cluster =
                doc.get("kind").and_then(Value::as_str) == Some(labels::HOSTED_CLUSTER_KIND);
            is_hosted_cluster.then_some((index, doc))
        })
    }

    /// Copy of this set with the autoscaling annotations on its HostedCluster
    ///
    /// Only the first HostedCluster is rewritten; all other manifests keep
    /// their original bytes. Applying the patch twice yields identical bytes.
    ///
    /// # Errors
    /// - `PatchError::HostedClusterNotFound` if no manifest decodes as a HostedCluster
    /// - `PatchError::Encode` if the modified document cannot be serialized
    pub fn patched(&self) -> Result<ManifestSet, PatchError> {
        let mut patched = self.clone();
        patched.patch_hosted_cluster()?;
        Ok(patched)
    }

    /// Patch in place, returning the index of the rewritten manifest
    pub fn patch_hosted_cluster(&mut self) -> Result<usize, PatchError> {
        let (index, mut doc) = self
            .find_hosted_cluster()
            .ok_or(PatchError::HostedClusterNotFound)?;

        let mut metadata = take_object(&mut doc, "metadata");
        let mut annotations = take_object(&mut metadata, "annotations");
        for (key, value) in labels::MIGRATION_ANNOTATIONS {
            annotations.insert(key.to_string(), Value::String(value.to_string()));
        }
        metadata.insert("annotations".to_string(), Value::Object(annotations));
        doc.insert("metadata".to_string(), Value::Object(metadata));

        let raw = serde_json::to_vec(&Value::Object(doc)).map_err(PatchError::Encode)?;
        self.0[index] = RawManifest(raw);
        Ok(index)
    }
}

/// Remove `parent[key]` as an object; missing or non-object values become empty.
fn take_object(parent: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match parent.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// A ManifestWork on the service cluster
///
/// Lives in the namespace named after the management cluster and is named
/// after the hosted cluster's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestWork {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub manifests: ManifestSet,
}

impl ManifestWork {
    /// Create new ManifestWork
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, manifests: ManifestSet) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            manifests,
        }
    }

    /// Annotations of the embedded HostedCluster, string values only
    #[must_use]
    pub fn hosted_cluster_annotations(&self) -> Option<crate::types::Metadata> {
        let (_, doc) = self.manifests.find_hosted_cluster()?;
        let annotations = doc
            .get("metadata")
            .and_then(|m| m.get("annotations"))
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Some(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawManifest {
        RawManifest::from_value(&value).unwrap()
    }

    fn hosted_cluster(annotations: Value) -> RawManifest {
        raw(json!({
            "apiVersion": "hypershift.openshift.io/v1beta1",
            "kind": "HostedCluster",
            "metadata": {
                "name": "test-cluster",
                "namespace": "ocm-production-abc123",
                "annotations": annotations,
            },
            "spec": {"release": {"image": "quay.io/ocp-release:4.17"}},
        }))
    }

    fn secret() -> RawManifest {
        RawManifest::new(r#"{"kind":"Secret",  "apiVersion":"v1","metadata":{"name":"pull-secret"}}"#)
    }

    fn annotations_of(set: &ManifestSet, index: usize) -> Value {
        let doc = set.manifests()[index].decode().unwrap();
        doc["metadata"]["annotations"].clone()
    }

    #[test]
    fn adds_annotations_alongside_existing_ones() {
        let set = ManifestSet::new(vec![hosted_cluster(json!({"other.annotation": "value"}))]);
        let patched = set.patched().unwrap();

        assert_eq!(
            annotations_of(&patched, 0),
            json!({
                "other.annotation": "value",
                "hypershift.openshift.io/topology": "dedicated-request-serving-components",
                "hypershift.openshift.io/resource-based-cp-auto-scaling": "true",
            })
        );
    }

    #[test]
    fn overwrites_stale_values() {
        let set = ManifestSet::new(vec![hosted_cluster(json!({
            "hypershift.openshift.io/topology": "old-value",
            "hypershift.openshift.io/resource-based-cp-auto-scaling": "false",
        }))]);
        let patched = set.patched().unwrap();

        assert_eq!(
            annotations_of(&patched, 0),
            json!({
                "hypershift.openshift.io/topology": "dedicated-request-serving-components",
                "hypershift.openshift.io/resource-based-cp-auto-scaling": "true",
            })
        );
    }

    #[test]
    fn creates_missing_metadata_levels() {
        let set = ManifestSet::new(vec![
            raw(json!({"kind": "HostedCluster"})),
        ]);
        let patched = set.patched().unwrap();
        assert_eq!(
            annotations_of(&patched, 0)["hypershift.openshift.io/topology"],
            "dedicated-request-serving-components"
        );

        let null_annotations = ManifestSet::new(vec![raw(json!({
            "kind": "HostedCluster",
            "metadata": {"name": "x", "annotations": null},
        }))]);
        let patched = null_annotations.patched().unwrap();
        assert_eq!(
            annotations_of(&patched, 0)["hypershift.openshift.io/resource-based-cp-auto-scaling"],
            "true"
        );
        assert_eq!(patched.manifests()[0].decode().unwrap()["metadata"]["name"], "x");
    }

    #[test]
    fn finds_hosted_cluster_among_other_kinds() {
        let cert = raw(json!({"kind": "Certificate", "metadata": {"name": "test-cert"}}));
        let set = ManifestSet::new(vec![secret(), hosted_cluster(json!({})), cert.clone()]);

        let mut patched = set.clone();
        let index = patched.patch_hosted_cluster().unwrap();
        assert_eq!(index, 1);
        assert_eq!(patched.manifests()[0].as_bytes(), set.manifests()[0].as_bytes());
        assert_eq!(patched.manifests()[2].as_bytes(), cert.as_bytes());
    }

    #[test]
    fn skips_malformed_manifests() {
        let set = ManifestSet::new(vec![
            RawManifest::new("{not json"),
            RawManifest::new("[1, 2, 3]"),
            hosted_cluster(json!({})),
        ]);
        let patched = set.patched().unwrap();
        assert_eq!(patched.manifests()[0].as_bytes(), b"{not json");
        assert_eq!(patched.manifests()[1].as_bytes(), b"[1, 2, 3]");
        assert_eq!(
            annotations_of(&patched, 2)["hypershift.openshift.io/topology"],
            "dedicated-request-serving-components"
        );
    }

    #[test]
    fn missing_hosted_cluster_is_an_error() {
        let set = ManifestSet::new(vec![secret(), RawManifest::new("garbage")]);
        assert!(matches!(set.patched(), Err(PatchError::HostedClusterNotFound)));
        assert!(matches!(
            ManifestSet::default().patched(),
            Err(PatchError::HostedClusterNotFound)
        ));
    }

    #[test]
    fn only_first_hosted_cluster_is_patched() {
        let second = hosted_cluster(json!({"marker": "second"}));
        let set = ManifestSet::new(vec![hosted_cluster(json!({"marker": "first"})), second.clone()]);
        let patched = set.patched().unwrap();

        assert_eq!(annotations_of(&patched, 0)["marker"], "first");
        assert_eq!(
            annotations_of(&patched, 0)["hypershift.openshift.io/topology"],
            "dedicated-request-serving-components"
        );
        assert_eq!(patched.manifests()[1].as_bytes(), second.as_bytes());
    }

    #[test]
    fn patch_is_idempotent() {
        let set = ManifestSet::new(vec![secret(), hosted_cluster(json!({"a": "b"}))]);
        let once = set.patched().unwrap();
        let twice = once.patched().unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.manifests()[1].as_bytes(), twice.manifests()[1].as_bytes());
    }

    #[test]
    fn original_set_is_untouched() {
        let set = ManifestSet::new(vec![hosted_cluster(json!({}))]);
        let before = set.clone();
        let _ = set.patched().unwrap();
        assert_eq!(set, before);
    }

    #[test]
    fn work_exposes_hosted_cluster_annotations() {
        let work = ManifestWork::new(
            "mgmt-cluster",
            "abc123",
            ManifestSet::new(vec![secret(), hosted_cluster(json!({"k": "v", "n": 1}))]),
        );
        let annotations = work.hosted_cluster_annotations().unwrap();
        assert_eq!(annotations.get("k").map(String::as_str), Some("v"));
        assert!(!annotations.contains_key("n"));

        let empty = ManifestWork::new("mgmt-cluster", "abc123", ManifestSet::new(vec![secret()]));
        assert!(empty.hosted_cluster_annotations().is_none());
    }

    #[test]
    fn snapshot_serde_embeds_documents() {
        let set = ManifestSet::new(vec![secret(), RawManifest::new("{broken")]);
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value[0]["kind"], "Secret");
        assert_eq!(value[1], "{broken");

        let back: ManifestSet = serde_json::from_value(value).unwrap();
        assert_eq!(back.manifests()[0].kind().as_deref(), Some("Secret"));
        assert_eq!(back.manifests()[1].as_bytes(), b"{broken");
    }
}
