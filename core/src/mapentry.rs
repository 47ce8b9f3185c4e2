//! Map Projection (C6, §4.6): folds a raw [`Resource`] plus C2/C5 output into the uniform
//! [`MapEntry`] record the query engine, trace engine, and GSF encoder all consume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kubescout_api::{argo::ApplicationStatus, StatusWithConditions};

use crate::drift::DriftedResource;
use crate::ownership::Ownership;
use crate::resource::Resource;

/// Status is the normalized readiness string from §3/§6.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
pub enum Status {
    Ready,
    NotReady,
    Failed,
    Pending,
    Unknown,
    Suspended,
    OutOfSync,
}

/// DriftSummary is the entry-level drift decoration from §3 (`Type`, `Summary`, `DetectedAt`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    #[serde(rename = "type")]
    pub drift_type: DriftType,
    pub summary: String,
    pub detected_at: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DriftType {
    Modified,
    Missing,
    Extra,
}

/// ConfigHubHierarchy is the opaque connected-mode decoration from §3/§9 ("treat as an opaque
/// optional enricher"); the core never populates it itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigHubHierarchy {
    pub org: String,
    pub space: String,
    pub unit: String,
    pub revision: String,
}

/// MapEntry is the uniform per-resource projection from §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: String,
    pub cluster: String,
    pub namespace: String,
    pub kind: String,
    pub name: String,
    pub api_version: String,
    pub owner: Option<Ownership>,
    pub deployer: Option<Ownership>,
    pub labels: BTreeMap<String, String>,
    pub drift: Option<DriftSummary>,
    pub variant: Option<String>,
    pub status: Status,
    pub confighub: Option<ConfigHubHierarchy>,
    pub ccves: Vec<String>,
}

/// GetField implements the `GetField(name) → (value, present)` lookup §4.7 requires of a map
/// entry, resolving `labels[key]` to `Labels[key]`.
impl MapEntry {
    pub fn get_field(&self, name: &str) -> Option<String> {
        if let Some(key) = name.strip_prefix("labels[").and_then(|s| s.strip_suffix(']')) {
            return self.labels.get(key).cloned();
        }
        match name {
            "kind" => Some(self.kind.clone()),
            "namespace" => Some(self.namespace.clone()),
            "name" => Some(self.name.clone()),
            "cluster" => Some(self.cluster.clone()),
            "owner" => self.owner.as_ref().map(|o| o.owner_type.display_name().to_string()),
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }
}

/// Build_entry folds `resource` + already-computed ownership/drift/decorations into a
/// [`MapEntry`] (§4.6). `deployer_path` is the resolved `spec.path`/`spec.source.path` of the
/// owning Kustomization/Application, when the caller (trace engine) has already fetched it — the
/// variant-inference rule 0/0′ in §4.8 needs it but fetching it is C8's job, not C6's.
pub fn build_entry(
    resource: &Resource,
    owner: Ownership,
    deployer: Option<Ownership>,
    deployer_path: Option<&str>,
    drift: Option<&DriftedResource>,
    confighub: Option<ConfigHubHierarchy>,
    ccves: Vec<String>,
) -> MapEntry {
    let id = resource.id();
    let status = derive_status(resource, &owner);
    let variant = derive_variant(resource, &owner, deployer_path);
    let drift = drift.filter(|d| d.has_drift()).map(|d| DriftSummary {
        drift_type: DriftType::Modified,
        summary: format!("{} field(s) differ from the last applied configuration", d.changes.len()),
        detected_at: String::new(),
    });

    MapEntry {
        id: id.canonical(),
        cluster: id.cluster,
        namespace: id.namespace,
        kind: id.kind,
        name: id.name,
        api_version: resource.api_version(),
        owner: Some(owner),
        deployer,
        labels: resource.labels().clone(),
        drift,
        variant,
        status,
        confighub,
        ccves,
    }
}

fn derive_status(resource: &Resource, owner: &Ownership) -> Status {
    if owner.owner_type.to_string() != "unknown" {
        // Suspended is orthogonal to GitOps kind and takes priority when declared.
        if resource
            .field("spec.suspend")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return Status::Suspended;
        }
    }

    match resource.kind() {
        "Deployment" | "StatefulSet" | "DaemonSet" => deployment_like_status(resource),
        "Pod" => pod_status(resource),
        "HelmRelease" | "Kustomization" | "GitRepository" | "OCIRepository" | "HelmRepository" | "Bucket" => {
            condition_ready_status(resource)
        }
        "Application" => application_status(resource),
        _ => Status::Unknown,
    }
}

fn deployment_like_status(resource: &Resource) -> Status {
    let ready = resource.field("status.readyReplicas").and_then(|v| v.as_i64());
    let desired = resource
        .field("status.replicas")
        .and_then(|v| v.as_i64())
        .or_else(|| resource.field("spec.replicas").and_then(|v| v.as_i64()));
    match (ready, desired) {
        (Some(r), Some(d)) if r == d => Status::Ready,
        (Some(_), Some(_)) => Status::NotReady,
        _ => Status::Pending,
    }
}

fn pod_status(resource: &Resource) -> Status {
    match resource.field("status.phase").and_then(|v| v.as_str().map(str::to_string)).as_deref() {
        Some("Running" | "Succeeded") => Status::Ready,
        Some("Pending") => Status::Pending,
        Some("Failed") => Status::Failed,
        _ => Status::Unknown,
    }
}

fn condition_ready_status(resource: &Resource) -> Status {
    let Some(status) = resource.status_as::<StatusWithConditions>() else {
        return Status::Pending;
    };
    if status.is_ready() {
        return Status::Ready;
    }
    match status.conditions.iter().find(|c| c.type_ == "Ready") {
        Some(_) if status.is_suspended() => Status::Suspended,
        Some(_) => Status::Failed,
        None => Status::Pending,
    }
}

fn application_status(resource: &Resource) -> Status {
    let sync = resource.field("status.sync.status");
    let health = resource.field("status.health.status");
    let sync_str = sync.as_ref().and_then(|v| v.as_str());
    let health_str = health.as_ref().and_then(|v| v.as_str());

    if resource.status_as::<ApplicationStatus>().is_some_and(|s| s.is_ready()) {
        return Status::Ready;
    }
    match (sync_str, health_str) {
        (Some(s), _) if s != "Synced" => Status::OutOfSync,
        (_, Some(h)) if h != "Healthy" => Status::Failed,
        _ => Status::Unknown,
    }
}

/// Derive_variant implements §4.8's priority list.
fn derive_variant(resource: &Resource, owner: &Ownership, deployer_path: Option<&str>) -> Option<String> {
    if matches!(owner.sub_type.as_deref(), Some("kustomization") | Some("application")) {
        if let Some(path) = deployer_path {
            if let Some(segment) = trailing_path_segment(path) {
                return Some(segment);
            }
        }
    }

    if let Some(instance) = resource.label("app.kubernetes.io/instance") {
        return Some(instance.to_string());
    }
    if let Some(env) = resource.label("environment").or_else(|| resource.label("env")) {
        return Some(env.to_string());
    }
    if let Some(ns) = resource.namespace() {
        if let Some(suffix) = namespace_environment_suffix(&ns) {
            return Some(suffix);
        }
    }
    Some(resource.name())
}

fn trailing_path_segment(path: &str) -> Option<String> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

const KNOWN_ENVIRONMENTS: &[&str] = &["prod", "production", "staging", "dev", "development", "test", "qa"];

fn namespace_environment_suffix(namespace: &str) -> Option<String> {
    namespace
        .rsplit_once('-')
        .map(|(_, suffix)| suffix)
        .filter(|suffix| KNOWN_ENVIRONMENTS.contains(suffix))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::OwnerType;
    use crate::testing::{resource, with_labels};

    fn flux_ownership() -> Ownership {
        Ownership {
            owner_type: OwnerType::Flux,
            sub_type: Some("kustomization".to_string()),
            name: "frontend".to_string(),
            namespace: "flux-system".to_string(),
        }
    }

    #[test]
    fn variant_prefers_deployer_path_over_labels() {
        let r = with_labels(
            resource("boutique", "apps", "v1", "Deployment", "frontend", serde_json::json!({})),
            &[("app.kubernetes.io/instance", "should-not-win")],
        );
        let entry = build_entry(&r, flux_ownership(), None, Some("./apps/prod"), None, None, Vec::new());
        assert_eq!(entry.variant.as_deref(), Some("prod"));
    }

    #[test]
    fn variant_falls_back_to_namespace_suffix() {
        let r = resource("myapp-prod", "apps", "v1", "Deployment", "myapp", serde_json::json!({}));
        let entry = build_entry(
            &r,
            Ownership {
                owner_type: OwnerType::Unknown,
                sub_type: None,
                name: String::new(),
                namespace: String::new(),
            },
            None,
            None,
            None,
            None,
            Vec::new(),
        );
        assert_eq!(entry.variant.as_deref(), Some("prod"));
    }

    #[test]
    fn deployment_ready_when_replicas_match() {
        let r = resource(
            "boutique",
            "apps",
            "v1",
            "Deployment",
            "frontend",
            serde_json::json!({"spec": {"replicas": 3}, "status": {"replicas": 3, "readyReplicas": 3}}),
        );
        let entry = build_entry(&r, flux_ownership(), None, None, None, None, Vec::new());
        assert_eq!(entry.status, Status::Ready);
    }

    #[test]
    fn get_field_resolves_labels_bracket_syntax() {
        let r = with_labels(
            resource("default", "apps", "v1", "Deployment", "frontend", serde_json::json!({})),
            &[("app", "frontend")],
        );
        let entry = build_entry(&r, flux_ownership(), None, None, None, None, Vec::new());
        assert_eq!(entry.get_field("labels[app]"), Some("frontend".to_string()));
        assert_eq!(entry.get_field("labels[missing]"), None);
    }
}
