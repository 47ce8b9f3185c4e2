//! Fixture builders shared by this crate's unit tests, in the style of the upstream
//! `clair-operator`'s `controller::testing` module.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::DynamicObject;
use kube::core::{GroupVersionKind, ObjectMeta, TypeMeta};
use serde_json::Value;

use crate::resource::Resource;

pub const CLUSTER: &str = "test-cluster";

/// Resource builds a [`Resource`] on [`CLUSTER`] with the given identity. `body` is merged
/// as additional top-level fields (typically `{"spec": ..., "status": ...}`).
pub fn resource(namespace: &str, group: &str, version: &str, kind: &str, name: &str, body: Value) -> Resource {
    let gvk = GroupVersionKind {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    };
    let mut obj = DynamicObject {
        types: Some(TypeMeta {
            api_version: if group.is_empty() {
                version.to_string()
            } else {
                format!("{group}/{version}")
            },
            kind: kind.to_string(),
        }),
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            ..Default::default()
        },
        data: Value::Object(Default::default()),
    };
    if let Value::Object(map) = body {
        if let Value::Object(data) = &mut obj.data {
            data.extend(map);
        }
    }
    Resource::new(CLUSTER, gvk, obj)
}

/// With_labels returns `r` with the given labels merged in.
pub fn with_labels(mut r: Resource, labels: &[(&str, &str)]) -> Resource {
    let mut map: BTreeMap<String, String> = r.inner().metadata.labels.clone().unwrap_or_default();
    for (k, v) in labels {
        map.insert(k.to_string(), v.to_string());
    }
    mutate(&mut r, |obj| obj.metadata.labels = Some(map));
    r
}

/// With_annotations returns `r` with the given annotations merged in.
pub fn with_annotations(mut r: Resource, annotations: &[(&str, &str)]) -> Resource {
    let mut map: BTreeMap<String, String> = r.inner().metadata.annotations.clone().unwrap_or_default();
    for (k, v) in annotations {
        map.insert(k.to_string(), v.to_string());
    }
    mutate(&mut r, |obj| obj.metadata.annotations = Some(map));
    r
}

/// With_owner_ref appends an ownerReference entry.
pub fn with_owner_ref(mut r: Resource, api_version: &str, kind: &str, name: &str, controller: bool) -> Resource {
    let oref = OwnerReference {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        uid: format!("{name}-uid"),
        controller: Some(controller),
        block_owner_deletion: Some(true),
    };
    mutate(&mut r, |obj| {
        obj.metadata
            .owner_references
            .get_or_insert_with(Vec::new)
            .push(oref);
    });
    r
}

fn mutate(r: &mut Resource, f: impl FnOnce(&mut DynamicObject)) {
    // Resource has no public mutable accessor by design (§3: "Immutable from the core's point
    // of view"); tests rebuild through the public constructor instead.
    let mut obj = r.inner().clone();
    f(&mut obj);
    *r = Resource::new(r.cluster().to_string(), gvk_of(r), obj);
}

fn gvk_of(r: &Resource) -> GroupVersionKind {
    GroupVersionKind {
        group: r.group().to_string(),
        version: r
            .api_version()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
        kind: r.kind().to_string(),
    }
}
