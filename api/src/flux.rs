//! Flux CD CRDs: the `source.toolkit.fluxcd.io`, `kustomize.toolkit.fluxcd.io`, and
//! `helm.toolkit.fluxcd.io` groups. Only the fields kubescout's trace engine (C8) and owner
//! detector (C2) need are modeled; these are not full API definitions.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{CrossNamespaceObjectReference, StatusWithConditions};

/// GitRepositorySpec is the subset of `GitRepository.spec` kubescout reads.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "source.toolkit.fluxcd.io",
    version = "v1",
    kind = "GitRepository",
    namespaced,
    status = "StatusWithConditions"
)]
#[serde(rename_all = "camelCase")]
pub struct GitRepositorySpec {
    /// URL is the repository address.
    pub url: String,
    /// Ref is the Git reference to resolve and monitor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<GitRepositoryRef>,
}

/// GitRepositoryRef pins a GitRepository to a branch, tag, semver range, or commit.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
pub struct GitRepositoryRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// OCIRepositorySpec is the subset of `OCIRepository.spec` kubescout reads.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "source.toolkit.fluxcd.io",
    version = "v1beta2",
    kind = "OCIRepository",
    namespaced,
    status = "StatusWithConditions"
)]
#[serde(rename_all = "camelCase")]
pub struct OCIRepositorySpec {
    /// URL is the OCI repository address, as `oci://`.
    pub url: String,
}

/// HelmRepositorySpec is the subset of `HelmRepository.spec` kubescout reads.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "source.toolkit.fluxcd.io",
    version = "v1",
    kind = "HelmRepository",
    namespaced,
    status = "StatusWithConditions"
)]
#[serde(rename_all = "camelCase")]
pub struct HelmRepositorySpec {
    /// URL is the Helm repository address.
    pub url: String,
}

/// BucketSpec is the subset of `Bucket.spec` kubescout reads.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "source.toolkit.fluxcd.io",
    version = "v1",
    kind = "Bucket",
    namespaced,
    status = "StatusWithConditions"
)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Endpoint is the bucket's object storage address.
    pub endpoint: String,
    /// BucketName is the name of the bucket to sync.
    pub bucket_name: String,
}

/// KustomizationSpec is the subset of `Kustomization.spec` kubescout reads (§4.4 step 2).
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "kustomize.toolkit.fluxcd.io",
    version = "v1",
    kind = "Kustomization",
    namespaced,
    status = "StatusWithConditions"
)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationSpec {
    /// SourceRef points at the GitRepository/OCIRepository/Bucket this Kustomization builds from.
    pub source_ref: CrossNamespaceObjectReference,
    /// Path is the directory within the source to build, e.g. `./apps/prod`. Used by variant
    /// inference (§4.8, rule 0).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// HelmReleaseSpec is the subset of `HelmRelease.spec` kubescout reads (§4.4 step 3).
#[derive(CustomResource, Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[kube(
    group = "helm.toolkit.fluxcd.io",
    version = "v2",
    kind = "HelmRelease",
    namespaced,
    status = "StatusWithConditions"
)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseSpec {
    /// Chart describes the Helm chart to install and where it comes from.
    pub chart: HelmChartTemplate,
}

/// HelmChartTemplate is the embedded chart template in a HelmRelease.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
pub struct HelmChartTemplate {
    pub spec: HelmChartTemplateSpec,
}

/// HelmChartTemplateSpec names the chart and its source.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartTemplateSpec {
    /// Chart is the chart name or path within the source.
    pub chart: String,
    /// SourceRef points at the HelmRepository/GitRepository/OCIRepository the chart is fetched
    /// from.
    pub source_ref: CrossNamespaceObjectReference,
}
