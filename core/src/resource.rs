//! Resource is the core's view of a live Kubernetes object: identity plus arbitrary nested
//! content, immutable once read (§3 "Entity: Resource").

use std::collections::BTreeMap;
use std::fmt;

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube::ResourceExt;
use serde_json::Value;

/// ResourceId identifies a Resource by `(cluster, group, version, kind, namespace, name)`.
/// Empty segments (cluster-scoped kind, empty group) are kept empty rather than elided, per §3.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub cluster: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    /// Canonical returns the `{cluster}/{namespace}/{group}/{kind}/{name}` string specified in
    /// §3/§6 as `MapEntry.ID` and the GSF `id` field.
    pub fn canonical(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.cluster, self.namespace, self.group, self.kind, self.name
        )
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Resource is a live Kubernetes object along with the cluster it was read from.
///
/// It wraps [`DynamicObject`] rather than a typed struct because C1 (§4.1) is required to read
/// arbitrary GroupVersionResources discovered at runtime; typed structs are only used for the
/// small set of GitOps CRDs in `kubescout-api` that the trace engine deliberately follows.
#[derive(Clone, Debug)]
pub struct Resource {
    cluster: String,
    gvk: GroupVersionKind,
    inner: DynamicObject,
}

impl Resource {
    /// New wraps a [`DynamicObject`] fetched from `cluster` under the given
    /// [`GroupVersionKind`].
    pub fn new(cluster: impl Into<String>, gvk: GroupVersionKind, inner: DynamicObject) -> Self {
        Self {
            cluster: cluster.into(),
            gvk,
            inner,
        }
    }

    pub fn id(&self) -> ResourceId {
        ResourceId {
            cluster: self.cluster.clone(),
            group: self.gvk.group.clone(),
            version: self.gvk.version.clone(),
            kind: self.gvk.kind.clone(),
            namespace: self.inner.namespace().unwrap_or_default(),
            name: self.inner.name_any(),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    pub fn group(&self) -> &str {
        &self.gvk.group
    }

    pub fn api_version(&self) -> String {
        if self.gvk.group.is_empty() {
            self.gvk.version.clone()
        } else {
            format!("{}/{}", self.gvk.group, self.gvk.version)
        }
    }

    pub fn namespace(&self) -> Option<String> {
        self.inner.namespace()
    }

    /// Namespace_str is [`Resource::namespace`] with cluster-scoped objects collapsed to `""`,
    /// the convention §3/§4.2 use for `Ownership.Namespace` and `ResourceId.namespace`.
    pub fn namespace_str(&self) -> String {
        self.inner.namespace().unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.inner.name_any()
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.inner.metadata.labels.as_ref().unwrap_or(&EMPTY)
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.inner.metadata.annotations.as_ref().unwrap_or(&EMPTY)
    }

    /// Label looks up a single label by key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.inner
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(key))
            .map(String::as_str)
    }

    /// Annotation looks up a single annotation by key.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.inner
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }

    pub fn owner_references(&self) -> &[k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference] {
        self.inner
            .metadata
            .owner_references
            .as_deref()
            .unwrap_or(&[])
    }

    /// Data returns the full object as a JSON value, e.g. for drift comparison or the `spec`/
    /// `status` field walks C3/C4 need.
    pub fn data(&self) -> Value {
        serde_json::to_value(&self.inner).unwrap_or(Value::Null)
    }

    /// Field looks up a dotted JSON path inside the object, e.g. `"spec.replicas"`.
    pub fn field(&self, path: &str) -> Option<Value> {
        let data = self.data();
        path.split('.')
            .try_fold(data, |acc, seg| acc.get(seg).cloned())
    }

    /// Status_as deserializes the object's `status` subresource into a typed status struct, for
    /// call sites that prefer a typed method (e.g. `StatusWithConditions::is_ready`) over walking
    /// the same JSON paths by hand. `None` when `status` is absent or doesn't match the shape.
    pub fn status_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.field("status").and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn last_applied_configuration(&self) -> Option<&str> {
        self.annotation("kubectl.kubernetes.io/last-applied-configuration")
    }

    pub fn inner(&self) -> &DynamicObject {
        &self.inner
    }
}

impl From<Resource> for ResourceId {
    fn from(r: Resource) -> Self {
        r.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::resource;

    #[test]
    fn canonical_id_keeps_empty_segments() {
        let id = ResourceId {
            cluster: "kind".into(),
            group: String::new(),
            version: "v1".into(),
            kind: "Node".into(),
            namespace: String::new(),
            name: "worker-1".into(),
        };
        assert_eq!(id.canonical(), "kind///Node/worker-1");
    }

    #[test]
    fn field_walks_dotted_path() {
        let r = resource(
            "default",
            "apps",
            "v1",
            "Deployment",
            "frontend",
            serde_json::json!({"spec": {"replicas": 3}}),
        );
        assert_eq!(r.field("spec.replicas"), Some(serde_json::json!(3)));
        assert_eq!(r.field("spec.missing"), None);
    }
}
