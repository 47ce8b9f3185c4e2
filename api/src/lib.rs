#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]
//! Api holds typed, read-only client structs for the GitOps controller CRDs that the trace
//! engine follows (Flux source/kustomize/helm controllers, Argo CD).
//!
//! kubescout never installs or reconciles any of these CRDs; it only ever `get`s and `list`s
//! them. The `CustomResource` derive is used purely for a typed [`kube::Api`], the same way the
//! upstream clair-operator uses it for CRDs it *does* own — ours just happen to belong to other
//! controllers.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use serde::{Deserialize, Serialize};

pub mod argo;
pub mod flux;

/// CrossNamespaceObjectReference mirrors the Flux `toolkit.fluxcd.io` source reference shape used
/// by both `Kustomization.spec.sourceRef` and `HelmRelease.spec.chart.spec.sourceRef`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrossNamespaceObjectReference {
    /// Kind of the referent, e.g. "GitRepository", "OCIRepository", "HelmRepository", "Bucket".
    pub kind: Option<String>,
    /// Name of the referent.
    pub name: String,
    /// Namespace of the referent, defaulting to the referring object's own namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// StatusWithConditions is the common status shape shared by every Flux CRD this crate reads: a
/// `conditions` list following the standard `metav1.Condition` shape.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, schemars::JsonSchema)]
pub struct StatusWithConditions {
    /// Conditions reports the object's reconciliation state.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl StatusWithConditions {
    /// Ready reports whether the `Ready` condition is present and `True`.
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.type_ == "Ready" && c.status == "True")
    }

    /// Suspended reports whether the object carries a `Ready=False, reason=Suspended` condition;
    /// Flux does not use a separate condition type for suspension.
    pub fn is_suspended(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.type_ == "Ready" && c.reason == "Suspended")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::{apimachinery::pkg::apis::meta::v1::Time, jiff::Timestamp};

    fn cond(type_: &str, status: &str, reason: &str) -> Condition {
        Condition {
            type_: type_.into(),
            status: status.into(),
            reason: reason.into(),
            message: String::new(),
            observed_generation: None,
            last_transition_time: Time(Timestamp::now()),
        }
    }

    #[test]
    fn ready_requires_true_status() {
        let s = StatusWithConditions {
            conditions: vec![cond("Ready", "False", "Progressing")],
        };
        assert!(!s.is_ready());
    }

    #[test]
    fn suspended_detected_via_ready_reason() {
        let s = StatusWithConditions {
            conditions: vec![cond("Ready", "False", "Suspended")],
        };
        assert!(s.is_suspended());
        assert!(!s.is_ready());
    }
}
