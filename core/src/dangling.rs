//! Dangling Finder (C4, §4.3): inverts/re-resolves [`Reference`]s produced by C3 against a
//! snapshot of resources and flags the ones whose target does not exist.
//!
//! Operates over an in-memory resource set rather than going back to the cluster per call — the
//! "arena of fetched-by-demand resources keyed by canonical ID" shape from §9 "Design notes".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::reference::{extract_references, Reference, ReferenceType};
use crate::resource::{Resource, ResourceId};

/// DanglingReference extends [`Reference`] with `Reason`/`Suggestion` (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DanglingReference {
    #[serde(flatten)]
    pub reference: Reference,
    pub reason: String,
    pub suggestion: String,
}

struct Index<'a> {
    by_identity: HashMap<(String, String, String, String), &'a Resource>,
    by_namespace_kind: HashMap<(String, String, String), Vec<&'a Resource>>,
}

impl<'a> Index<'a> {
    fn build(resources: &'a [Resource]) -> Self {
        let mut by_identity = HashMap::new();
        let mut by_namespace_kind: HashMap<(String, String, String), Vec<&Resource>> = HashMap::new();
        for r in resources {
            let id = r.id();
            by_identity.insert((id.cluster.clone(), id.namespace.clone(), id.kind.clone(), id.name.clone()), r);
            by_namespace_kind
                .entry((id.cluster.clone(), id.namespace.clone(), id.kind.clone()))
                .or_default()
                .push(r);
        }
        Self { by_identity, by_namespace_kind }
    }

    fn get(&self, id: &ResourceId) -> Option<&'a Resource> {
        self.by_identity
            .get(&(id.cluster.clone(), id.namespace.clone(), id.kind.clone(), id.name.clone()))
            .copied()
    }

    fn of_kind(&self, cluster: &str, namespace: &str, kind: &str) -> &[&'a Resource] {
        self.by_namespace_kind
            .get(&(cluster.to_string(), namespace.to_string(), kind.to_string()))
            .map_or(&[][..], |v| v.as_slice())
    }
}

/// Find_dangling runs C4 over a full resource snapshot. Errors on one kind are the caller's
/// concern (§4.3 "Failure semantics") — this function assumes the snapshot already reflects a
/// best-effort union of whatever C1 managed to list.
pub fn find_dangling(resources: &[Resource]) -> Vec<DanglingReference> {
    let index = Index::build(resources);
    let mut out = Vec::new();

    for resource in resources {
        if is_exempt_service(resource) {
            continue;
        }
        for reference in extract_references(resource) {
            match &reference.selector {
                Some(selector) => {
                    let matches = index
                        .of_kind(&reference.from.cluster, &reference.from.namespace, &reference.to.kind)
                        .iter()
                        .any(|candidate| selector.iter().all(|(k, v)| candidate.label(k) == Some(v.as_str())));
                    if !matches {
                        out.push(DanglingReference {
                            reference,
                            reason: "no matching pods".to_string(),
                            suggestion: "check the selector matches the workload's pod template labels".to_string(),
                        });
                    }
                }
                None => {
                    if index.get(&reference.to).is_none() {
                        let (reason, suggestion) = not_found_reason(&reference);
                        out.push(DanglingReference { reference, reason, suggestion });
                    }
                }
            }
        }
    }

    out.extend(unmounted_pvcs(resources));
    out
}

fn is_exempt_service(resource: &Resource) -> bool {
    if resource.kind() != "Service" {
        return false;
    }
    let is_external_name = resource.field("spec.type").and_then(|v| v.as_str().map(str::to_string)) == Some("ExternalName".to_string());
    let is_headless = resource.field("spec.clusterIP").and_then(|v| v.as_str().map(str::to_string)) == Some("None".to_string());
    let is_selector_less = resource
        .field("spec.selector")
        .and_then(|v| v.as_object().map(|o| o.is_empty()))
        .unwrap_or(true);
    is_external_name || is_headless || is_selector_less
}

fn not_found_reason(reference: &Reference) -> (String, String) {
    match reference.ref_type {
        ReferenceType::ScaleTarget => (
            "target not found".to_string(),
            format!("create {} \"{}\" or fix spec.scaleTargetRef", reference.to.kind, reference.to.name),
        ),
        ReferenceType::Backend => (
            "not found".to_string(),
            format!("create Service \"{}\" or fix the Ingress backend", reference.to.name),
        ),
        _ => (
            "not found".to_string(),
            format!("create {} \"{}\" or remove the reference", reference.to.kind, reference.to.name),
        ),
    }
}

fn unmounted_pvcs(resources: &[Resource]) -> Vec<DanglingReference> {
    let mounted: std::collections::HashSet<ResourceId> = resources
        .iter()
        .flat_map(extract_references)
        .filter(|r| r.ref_type == ReferenceType::Mounts && r.selector.is_none())
        .map(|r| r.to)
        .collect();

    resources
        .iter()
        .filter(|r| r.kind() == "PersistentVolumeClaim")
        .filter(|pvc| !mounted.contains(&pvc.id()))
        .map(|pvc| {
            let id = pvc.id();
            DanglingReference {
                reference: Reference {
                    from: id.clone(),
                    to: id,
                    selector: None,
                    ref_type: ReferenceType::Mounts,
                    path: "spec.volumes[*].persistentVolumeClaim.claimName".to_string(),
                },
                reason: "not mounted by any pod".to_string(),
                suggestion: "mount this claim from a workload or delete it if unused".to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::resource;

    #[test]
    fn dangling_backend_skips_external_name_service() {
        let ingress = resource(
            "default",
            "networking.k8s.io",
            "v1",
            "Ingress",
            "web",
            serde_json::json!({"spec": {"rules": [{"http": {"paths": [{"backend": {"service": {"name": "api"}}}]}}]}}),
        );
        let external_name = resource(
            "default",
            "",
            "v1",
            "Service",
            "ExternalName-api",
            serde_json::json!({"spec": {"type": "ExternalName", "externalName": "api.example.com"}}),
        );
        let found = find_dangling(&[ingress, external_name]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reference.ref_type, ReferenceType::Backend);
        assert_eq!(found[0].reference.to.name, "api");
    }

    #[test]
    fn hpa_missing_scale_target_is_dangling() {
        let hpa = resource(
            "default",
            "autoscaling",
            "v2",
            "HorizontalPodAutoscaler",
            "cart-hpa",
            serde_json::json!({"spec": {"scaleTargetRef": {"kind": "Deployment", "name": "cart"}}}),
        );
        let found = find_dangling(&[hpa]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reason, "target not found");
    }

    #[test]
    fn service_selector_with_matching_pod_is_not_dangling() {
        let svc = resource(
            "default",
            "",
            "v1",
            "Service",
            "api",
            serde_json::json!({"spec": {"selector": {"app": "api"}}}),
        );
        let pod = crate::testing::with_labels(
            resource("default", "", "v1", "Pod", "api-abc", serde_json::json!({})),
            &[("app", "api")],
        );
        assert!(find_dangling(&[svc, pod]).is_empty());
    }

    #[test]
    fn selector_less_pdb_is_never_flagged() {
        let pdb = resource(
            "default",
            "policy",
            "v1",
            "PodDisruptionBudget",
            "none",
            serde_json::json!({"spec": {"selector": {}}}),
        );
        assert!(find_dangling(&[pdb]).is_empty());
    }
}
