//! Owner Detector (C2, §4.2): a pure, fixed-priority classifier from labels/annotations/
//! ownerReferences to a single [`Ownership`] record.

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// OwnerType is the coarse classification in §3 "Entity: Ownership".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OwnerType {
    Flux,
    Argo,
    Helm,
    Terraform,
    Confighub,
    Crossplane,
    K8s,
    Unknown,
}

impl OwnerType {
    /// Display_name is the capitalized label used at the external query/GSF surface (§6).
    pub fn display_name(self) -> &'static str {
        match self {
            OwnerType::Flux => "Flux",
            OwnerType::Argo => "ArgoCD",
            OwnerType::Helm => "Helm",
            OwnerType::Terraform => "Terraform",
            OwnerType::Confighub => "ConfigHub",
            OwnerType::Crossplane => "Crossplane",
            OwnerType::K8s => "K8s",
            OwnerType::Unknown => "Native",
        }
    }
}

/// Ownership is the attribute set C2 produces for one [`Resource`] (§3).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    #[serde(rename = "type")]
    pub owner_type: OwnerType,
    pub sub_type: Option<String>,
    pub name: String,
    pub namespace: String,
}

impl Ownership {
    fn new(owner_type: OwnerType, sub_type: Option<&str>, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            owner_type,
            sub_type: sub_type.map(str::to_string),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    fn unknown() -> Self {
        Self::new(OwnerType::Unknown, None, String::new(), String::new())
    }
}

const FLUX_KUSTOMIZE_NAME: &str = "kustomize.toolkit.fluxcd.io/name";
const FLUX_KUSTOMIZE_NAMESPACE: &str = "kustomize.toolkit.fluxcd.io/namespace";
const FLUX_HELMRELEASE_NAME: &str = "helm.toolkit.fluxcd.io/name";
const FLUX_HELMRELEASE_NAMESPACE: &str = "helm.toolkit.fluxcd.io/namespace";
const ARGO_INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
const ARGOCD_INSTANCE_LABEL: &str = "argocd.argoproj.io/instance";
const ARGOCD_TRACKING_ANNOTATION: &str = "argocd.argoproj.io/tracking-id";
const HELM_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
const HELM_RELEASE_NAME: &str = "meta.helm.sh/release-name";
const HELM_RELEASE_NAMESPACE: &str = "meta.helm.sh/release-namespace";
const TERRAFORM_PREFIX: &str = "app.terraform.io/";
const CONFIGHUB_UNIT_SLUG: &str = "confighub.com/UnitSlug";
const CROSSPLANE_CLAIM_NAME: &str = "crossplane.io/claim-name";
const CROSSPLANE_COMPOSITE: &str = "crossplane.io/composite";
const CROSSPLANE_COMPOSITION_RESOURCE_NAME: &str = "crossplane.io/composition-resource-name";

/// Detect_ownership is the pure function §4.2 specifies: no I/O, deterministic, exactly one
/// match. Evaluated in the fixed priority order; first match wins (Testable Properties 2, 3).
pub fn detect_ownership(resource: &Resource) -> Ownership {
    if let Some(name) = resource.label(FLUX_KUSTOMIZE_NAME) {
        let namespace = resource
            .label(FLUX_KUSTOMIZE_NAMESPACE)
            .unwrap_or_else(|| resource.namespace_str());
        return Ownership::new(OwnerType::Flux, Some("kustomization"), name, namespace);
    }

    if let Some(name) = resource.label(FLUX_HELMRELEASE_NAME) {
        let namespace = resource
            .label(FLUX_HELMRELEASE_NAMESPACE)
            .unwrap_or_else(|| resource.namespace_str());
        return Ownership::new(OwnerType::Flux, Some("helmrelease"), name, namespace);
    }

    if let Some(instance) = resource.label(ARGO_INSTANCE_LABEL) {
        let has_argocd_marker =
            resource.label(ARGOCD_INSTANCE_LABEL).is_some() || resource.annotation(ARGOCD_TRACKING_ANNOTATION).is_some();
        if has_argocd_marker {
            return Ownership::new(OwnerType::Argo, Some("application"), instance, resource.namespace_str());
        }
        // §4.2 rule 3 / Testable Property 3: the instance label alone is never sufficient.
    }

    if resource.label(HELM_MANAGED_BY) == Some("Helm") {
        let name = resource.annotation(HELM_RELEASE_NAME).unwrap_or("");
        let namespace = resource
            .annotation(HELM_RELEASE_NAMESPACE)
            .map(str::to_string)
            .unwrap_or_else(|| resource.namespace_str());
        return Ownership::new(OwnerType::Helm, Some("release"), name, namespace);
    }

    if resource
        .annotations()
        .keys()
        .any(|k| k.starts_with(TERRAFORM_PREFIX))
    {
        return Ownership::new(OwnerType::Terraform, None, "", resource.namespace_str());
    }

    if let Some(slug) = resource.label(CONFIGHUB_UNIT_SLUG) {
        return Ownership::new(OwnerType::Confighub, None, slug, resource.namespace_str());
    }

    if let Some(claim) = resource.label(CROSSPLANE_CLAIM_NAME) {
        return Ownership::new(OwnerType::Crossplane, Some("claim"), claim, resource.namespace_str());
    }
    if let Some(composite) = resource.label(CROSSPLANE_COMPOSITE) {
        return Ownership::new(OwnerType::Crossplane, Some("composite"), composite, resource.namespace_str());
    }
    if let Some(managed) = resource.label(CROSSPLANE_COMPOSITION_RESOURCE_NAME) {
        return Ownership::new(
            OwnerType::Crossplane,
            Some("managed-resource"),
            managed,
            resource.namespace_str(),
        );
    }

    if !resource.owner_references().is_empty() {
        let owner = &resource.owner_references()[0];
        return Ownership::new(OwnerType::K8s, None, owner.name.clone(), resource.namespace_str());
    }

    Ownership::unknown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{resource, with_annotations, with_labels, with_owner_ref};

    #[test]
    fn flux_kustomization_beats_helm_labels() {
        let r = with_labels(
            resource("boutique", "apps", "v1", "Deployment", "frontend", serde_json::json!({})),
            &[
                (FLUX_KUSTOMIZE_NAME, "frontend"),
                (FLUX_KUSTOMIZE_NAMESPACE, "flux-system"),
                (HELM_MANAGED_BY, "Helm"),
            ],
        );
        let o = detect_ownership(&r);
        assert_eq!(o.owner_type, OwnerType::Flux);
        assert_eq!(o.sub_type.as_deref(), Some("kustomization"));
        assert_eq!(o.name, "frontend");
        assert_eq!(o.namespace, "flux-system");
    }

    #[test]
    fn argo_instance_label_alone_is_native() {
        let r = with_labels(
            resource("default", "apps", "v1", "Deployment", "payment", serde_json::json!({})),
            &[(ARGO_INSTANCE_LABEL, "payment")],
        );
        let o = detect_ownership(&r);
        assert_eq!(o.owner_type, OwnerType::Unknown);
        assert_eq!(o.owner_type.display_name(), "Native");
    }

    #[test]
    fn argo_requires_both_labels() {
        let r = with_labels(
            resource("default", "apps", "v1", "Deployment", "payment", serde_json::json!({})),
            &[(ARGO_INSTANCE_LABEL, "payment"), (ARGOCD_INSTANCE_LABEL, "payment")],
        );
        let o = detect_ownership(&r);
        assert_eq!(o.owner_type, OwnerType::Argo);
    }

    #[test]
    fn helm_direct_reads_release_annotations() {
        let r = with_annotations(
            with_labels(
                resource("default", "apps", "v1", "Deployment", "web", serde_json::json!({})),
                &[(HELM_MANAGED_BY, "Helm")],
            ),
            &[(HELM_RELEASE_NAME, "web"), (HELM_RELEASE_NAMESPACE, "default")],
        );
        let o = detect_ownership(&r);
        assert_eq!(o.owner_type, OwnerType::Helm);
        assert_eq!(o.name, "web");
    }

    #[test]
    fn native_falls_back_to_owner_references() {
        let r = with_owner_ref(
            resource("default", "apps", "v1", "Pod", "frontend-abcde", serde_json::json!({})),
            "apps/v1",
            "ReplicaSet",
            "frontend-7f8",
            true,
        );
        let o = detect_ownership(&r);
        assert_eq!(o.owner_type, OwnerType::K8s);
        assert_eq!(o.name, "frontend-7f8");
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let r = resource("default", "apps", "v1", "Deployment", "debug", serde_json::json!({}));
        assert_eq!(detect_ownership(&r).owner_type, OwnerType::Unknown);
    }
}
