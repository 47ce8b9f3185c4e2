//! Reference Extractor (C3, §4.3): typed forward references out of a single [`Resource`].
//!
//! A pure, deterministic walk (Testable Property 8) — no I/O, no knowledge of whether a target
//! actually exists. Resolving/inverting these is [`crate::dangling`]'s job (C4).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{Resource, ResourceId};

/// ReferenceType enumerates the reference kinds named in §3/§4.3.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ReferenceType {
    Owns,
    Selects,
    Mounts,
    References,
    Volume,
    EnvFrom,
    Env,
    Backend,
    ScaleTarget,
    Tls,
    ImagePullSecret,
}

/// Reference is `(From, To, Type, Path)` from §3. `To` may be a partial [`ResourceId`] (empty
/// `name`) when the reference is selector-based, in which case `selector` carries the match
/// expression instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub from: ResourceId,
    pub to: ResourceId,
    pub selector: Option<BTreeMap<String, String>>,
    pub ref_type: ReferenceType,
    pub path: String,
}

impl Reference {
    fn concrete(from: ResourceId, to: ResourceId, ref_type: ReferenceType, path: impl Into<String>) -> Self {
        Self {
            from,
            to,
            selector: None,
            ref_type,
            path: path.into(),
        }
    }

    fn selector_based(from: ResourceId, to_kind: &str, selector: BTreeMap<String, String>, ref_type: ReferenceType, path: impl Into<String>) -> Self {
        let to = ResourceId {
            cluster: from.cluster.clone(),
            group: String::new(),
            version: String::new(),
            kind: to_kind.to_string(),
            namespace: from.namespace.clone(),
            name: String::new(),
        };
        Self {
            from,
            to,
            selector: Some(selector),
            ref_type,
            path: path.into(),
        }
    }
}

const TEMPLATED_WORKLOAD_KINDS: &[&str] = &["Deployment", "StatefulSet", "DaemonSet", "Job"];

/// Extract_references walks `resource` and returns every forward reference C3 defines (§4.3).
pub fn extract_references(resource: &Resource) -> Vec<Reference> {
    let mut refs = Vec::new();
    let data = resource.data();
    let id = resource.id();

    match resource.kind() {
        k if TEMPLATED_WORKLOAD_KINDS.contains(&k) => extract_pod_spec_refs(&id, &data, "spec.template.spec", &mut refs),
        "Pod" => extract_pod_spec_refs(&id, &data, "spec", &mut refs),
        "CronJob" => extract_pod_spec_refs(&id, &data, "spec.jobTemplate.spec.template.spec", &mut refs),
        "Service" => extract_service_refs(&id, &data, &mut refs),
        "Ingress" => extract_ingress_refs(&id, &data, &mut refs),
        "ServiceAccount" => extract_service_account_refs(&id, &data, &mut refs),
        "HorizontalPodAutoscaler" => extract_hpa_refs(&id, &data, &mut refs),
        "PodDisruptionBudget" => extract_pdb_refs(&id, &data, &mut refs),
        _ => {}
    }

    extract_owner_refs(resource, &mut refs);
    refs
}

fn at<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |acc, seg| acc.get(seg))
}

fn extract_pod_spec_refs(id: &ResourceId, data: &Value, pod_spec_path: &str, out: &mut Vec<Reference>) {
    let Some(containers) = at(data, &format!("{pod_spec_path}.containers")).and_then(Value::as_array) else {
        return;
    };
    for (ci, c) in containers.iter().enumerate() {
        if let Some(env_from) = c.get("envFrom").and_then(Value::as_array) {
            for (ei, ef) in env_from.iter().enumerate() {
                let path = format!("{pod_spec_path}.containers[{ci}].envFrom[{ei}]");
                if let Some(name) = ef.pointer("/configMapRef/name").and_then(Value::as_str) {
                    out.push(target(id, "ConfigMap", name, ReferenceType::EnvFrom, path.clone()));
                }
                if let Some(name) = ef.pointer("/secretRef/name").and_then(Value::as_str) {
                    out.push(target(id, "Secret", name, ReferenceType::EnvFrom, path));
                }
            }
        }
        if let Some(env) = c.get("env").and_then(Value::as_array) {
            for (ei, e) in env.iter().enumerate() {
                let path = format!("{pod_spec_path}.containers[{ci}].env[{ei}]");
                if let Some(name) = e.pointer("/valueFrom/configMapKeyRef/name").and_then(Value::as_str) {
                    out.push(target(id, "ConfigMap", name, ReferenceType::Env, path.clone()));
                }
                if let Some(name) = e.pointer("/valueFrom/secretKeyRef/name").and_then(Value::as_str) {
                    out.push(target(id, "Secret", name, ReferenceType::Env, path));
                }
            }
        }
    }

    if let Some(volumes) = at(data, &format!("{pod_spec_path}.volumes")).and_then(Value::as_array) {
        for (vi, v) in volumes.iter().enumerate() {
            let path = format!("{pod_spec_path}.volumes[{vi}]");
            if let Some(name) = v.pointer("/configMap/name").and_then(Value::as_str) {
                out.push(target(id, "ConfigMap", name, ReferenceType::Volume, path.clone()));
            }
            if let Some(name) = v.pointer("/secret/secretName").and_then(Value::as_str) {
                out.push(target(id, "Secret", name, ReferenceType::Volume, path.clone()));
            }
            if let Some(name) = v.pointer("/persistentVolumeClaim/claimName").and_then(Value::as_str) {
                out.push(target(id, "PersistentVolumeClaim", name, ReferenceType::Mounts, path));
            }
        }
    }
}

fn extract_service_refs(id: &ResourceId, data: &Value, out: &mut Vec<Reference>) {
    if let Some(selector) = at(data, "spec.selector").and_then(Value::as_object) {
        let map = string_map(selector);
        if !map.is_empty() {
            out.push(Reference::selector_based(id.clone(), "Pod", map, ReferenceType::Selects, "spec.selector"));
        }
    }
}

fn extract_ingress_refs(id: &ResourceId, data: &Value, out: &mut Vec<Reference>) {
    if let Some(tls) = at(data, "spec.tls").and_then(Value::as_array) {
        for (ti, t) in tls.iter().enumerate() {
            if let Some(name) = t.get("secretName").and_then(Value::as_str) {
                out.push(target(id, "Secret", name, ReferenceType::Tls, format!("spec.tls[{ti}].secretName")));
            }
        }
    }
    if let Some(rules) = at(data, "spec.rules").and_then(Value::as_array) {
        for (ri, rule) in rules.iter().enumerate() {
            let Some(paths) = rule.pointer("/http/paths").and_then(Value::as_array) else {
                continue;
            };
            for (pi, p) in paths.iter().enumerate() {
                if let Some(name) = p.pointer("/backend/service/name").and_then(Value::as_str) {
                    out.push(target(
                        id,
                        "Service",
                        name,
                        ReferenceType::Backend,
                        format!("spec.rules[{ri}].http.paths[{pi}].backend.service.name"),
                    ));
                }
            }
        }
    }
}

fn extract_service_account_refs(id: &ResourceId, data: &Value, out: &mut Vec<Reference>) {
    for field in ["secrets", "imagePullSecrets"] {
        if let Some(arr) = data.get(field).and_then(Value::as_array) {
            for (i, entry) in arr.iter().enumerate() {
                if let Some(name) = entry.get("name").and_then(Value::as_str) {
                    out.push(target(id, "Secret", name, ReferenceType::ImagePullSecret, format!("{field}[{i}].name")));
                }
            }
        }
    }
}

fn extract_hpa_refs(id: &ResourceId, data: &Value, out: &mut Vec<Reference>) {
    let Some(target_ref) = at(data, "spec.scaleTargetRef") else {
        return;
    };
    let (Some(kind), Some(name)) = (
        target_ref.get("kind").and_then(Value::as_str),
        target_ref.get("name").and_then(Value::as_str),
    ) else {
        return;
    };
    let (group, version) = match target_ref.get("apiVersion").and_then(Value::as_str) {
        Some(api_version) => split_api_version(api_version),
        None => (String::new(), "v1".to_string()),
    };
    let to = ResourceId {
        cluster: id.cluster.clone(),
        group,
        version,
        kind: kind.to_string(),
        namespace: id.namespace.clone(),
        name: name.to_string(),
    };
    out.push(Reference::concrete(id.clone(), to, ReferenceType::ScaleTarget, "spec.scaleTargetRef"));
}

fn extract_pdb_refs(id: &ResourceId, data: &Value, out: &mut Vec<Reference>) {
    if let Some(selector) = at(data, "spec.selector.matchLabels").and_then(Value::as_object) {
        let map = string_map(selector);
        if !map.is_empty() {
            out.push(Reference::selector_based(
                id.clone(),
                "Pod",
                map,
                ReferenceType::Selects,
                "spec.selector.matchLabels",
            ));
        }
    }
}

fn extract_owner_refs(resource: &Resource, out: &mut Vec<Reference>) {
    let child = resource.id();
    for (i, owner) in resource.owner_references().iter().enumerate() {
        let (group, version) = split_api_version(&owner.api_version);
        let from = ResourceId {
            cluster: child.cluster.clone(),
            group,
            version,
            kind: owner.kind.clone(),
            namespace: child.namespace.clone(),
            name: owner.name.clone(),
        };
        out.push(Reference::concrete(
            from,
            child.clone(),
            ReferenceType::Owns,
            format!("metadata.ownerReferences[{i}]"),
        ));
    }
}

fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

fn target(id: &ResourceId, kind: &str, name: &str, ref_type: ReferenceType, path: impl Into<String>) -> Reference {
    let to = ResourceId {
        cluster: id.cluster.clone(),
        group: String::new(),
        version: "v1".to_string(),
        kind: kind.to_string(),
        namespace: id.namespace.clone(),
        name: name.to_string(),
    };
    Reference::concrete(id.clone(), to, ref_type, path)
}

fn string_map(obj: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    obj.iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::resource;

    #[test]
    fn deployment_yields_envfrom_env_and_volume_refs() {
        let r = resource(
            "boutique",
            "apps",
            "v1",
            "Deployment",
            "frontend",
            serde_json::json!({
                "spec": {"template": {"spec": {
                    "containers": [{
                        "envFrom": [{"configMapRef": {"name": "frontend-config"}}],
                        "env": [{"valueFrom": {"secretKeyRef": {"name": "frontend-secret"}}}],
                    }],
                    "volumes": [{"persistentVolumeClaim": {"claimName": "frontend-data"}}],
                }}}
            }),
        );
        let refs = extract_references(&r);
        assert!(refs.iter().any(|r| r.ref_type == ReferenceType::EnvFrom && r.to.name == "frontend-config"));
        assert!(refs.iter().any(|r| r.ref_type == ReferenceType::Env && r.to.name == "frontend-secret"));
        assert!(refs.iter().any(|r| r.ref_type == ReferenceType::Mounts && r.to.name == "frontend-data"));
    }

    #[test]
    fn service_selector_is_partial_target() {
        let r = resource(
            "default",
            "",
            "v1",
            "Service",
            "api",
            serde_json::json!({"spec": {"selector": {"app": "api"}}}),
        );
        let refs = extract_references(&r);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_type, ReferenceType::Selects);
        assert!(refs[0].to.name.is_empty());
        assert_eq!(refs[0].selector.as_ref().unwrap().get("app").unwrap(), "api");
    }

    #[test]
    fn hpa_scale_target_ref() {
        let r = resource(
            "default",
            "autoscaling",
            "v2",
            "HorizontalPodAutoscaler",
            "cart-hpa",
            serde_json::json!({"spec": {"scaleTargetRef": {"kind": "Deployment", "name": "cart"}}}),
        );
        let refs = extract_references(&r);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_type, ReferenceType::ScaleTarget);
        assert_eq!(refs[0].to.kind, "Deployment");
        assert_eq!(refs[0].to.name, "cart");
    }

    #[test]
    fn owner_references_emit_owns_reference() {
        let r = crate::testing::with_owner_ref(
            resource("default", "apps", "v1", "Pod", "frontend-abcde", serde_json::json!({})),
            "apps/v1",
            "ReplicaSet",
            "frontend-7f8",
            true,
        );
        let refs = extract_references(&r);
        let owns = refs.iter().find(|r| r.ref_type == ReferenceType::Owns).unwrap();
        assert_eq!(owns.from.kind, "ReplicaSet");
        assert_eq!(owns.to.name, "frontend-abcde");
    }
}
