//! Argo CD's `argoproj.io` `Application` CRD. Only the fields the owner detector (C2) and trace
//! engine (C8, §4.4 step 4) need are modeled.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ApplicationSpec is the subset of `Application.spec` kubescout reads.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "argoproj.io",
    version = "v1alpha1",
    kind = "Application",
    namespaced,
    status = "ApplicationStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Source is the single-source form of `spec.source`. Multi-source Applications
    /// (`spec.sources`) report only the first source for trace purposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ApplicationSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ApplicationSource>,
}

impl ApplicationSpec {
    /// Primary_source returns `spec.source`, falling back to the first entry of `spec.sources`.
    pub fn primary_source(&self) -> Option<&ApplicationSource> {
        self.source.as_ref().or_else(|| self.sources.first())
    }
}

/// ApplicationSource names the repository and path Argo CD renders manifests from.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    pub repo_url: String,
    /// Path is the directory within the repository. Used by variant inference (§4.8, rule 0′).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_revision: Option<String>,
}

/// ApplicationStatus is the subset of `Application.status` kubescout reads to derive
/// `MapEntry.Status` (§4.6: `sync=Synced AND health=Healthy`).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    #[serde(default)]
    pub sync: SyncStatus,
    #[serde(default)]
    pub health: HealthStatus,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
pub struct SyncStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
}

impl ApplicationStatus {
    /// Ready reports the normalized readiness used by §4.6: synced and healthy.
    pub fn is_ready(&self) -> bool {
        self.sync.status == "Synced" && self.health.status == "Healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_source_prefers_single_source() {
        let spec = ApplicationSpec {
            source: Some(ApplicationSource {
                repo_url: "single".into(),
                ..Default::default()
            }),
            sources: vec![ApplicationSource {
                repo_url: "multi".into(),
                ..Default::default()
            }],
        };
        assert_eq!(spec.primary_source().unwrap().repo_url, "single");
    }

    #[test]
    fn primary_source_falls_back_to_sources() {
        let spec = ApplicationSpec {
            source: None,
            sources: vec![ApplicationSource {
                repo_url: "multi".into(),
                ..Default::default()
            }],
        };
        assert_eq!(spec.primary_source().unwrap().repo_url, "multi");
    }

    #[test]
    fn ready_requires_synced_and_healthy() {
        let mut status = ApplicationStatus {
            sync: SyncStatus {
                status: "Synced".into(),
            },
            health: HealthStatus {
                status: "Degraded".into(),
            },
        };
        assert!(!status.is_ready());
        status.health.status = "Healthy".into();
        assert!(status.is_ready());
    }
}
