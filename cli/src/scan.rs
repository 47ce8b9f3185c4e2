//! Scan composes C1/C2/C3/C5/C6 into the one snapshot every other public entry point (§9
//! "External collaborators") is built from: list/get the resource set, attribute ownership,
//! optionally detect drift and extract relations, then project into [`MapEntry`]s.

use kubescout_core::config::ScanConfig;
use kubescout_core::drift::detect_drift;
use kubescout_core::mapentry::{build_entry, MapEntry};
use kubescout_core::ownership::{detect_ownership, Ownership};
use kubescout_core::reader::ClusterReader;
use kubescout_core::reference::{extract_references, Reference};
use kubescout_core::resource::Resource;

use crate::Result;

/// ScanResult is the resource arena plus its C6 projection: everything downstream (query
/// filtering, dangling-reference analysis, GSF encoding, CCVE scanning) reads from this rather
/// than re-listing the cluster.
pub struct ScanResult {
    pub resources: Vec<Resource>,
    pub entries: Vec<MapEntry>,
    pub relations: Vec<Reference>,
}

/// Scan runs one full C1→C6 pass over `config`'s scope.
pub async fn scan(reader: &ClusterReader, config: &ScanConfig) -> Result<ScanResult> {
    let resources = reader.list(&config.scope).await?;

    let relations = if config.extract_relations {
        resources.iter().flat_map(extract_references).collect()
    } else {
        Vec::new()
    };

    let mut entries = Vec::with_capacity(resources.len());
    for resource in &resources {
        let owner = detect_ownership(resource);
        let path = deployer_path(reader, &owner).await?;
        let drift = if config.detect_drift { detect_drift(resource) } else { None };
        // `deployer`/`confighub`/`ccves` stay at their disconnected-mode defaults (§9 "Open
        // questions": ConfigHub connected mode is an opaque enricher this scan never populates).
        entries.push(build_entry(resource, owner, None, path.as_deref(), drift.as_ref(), None, Vec::new()));
    }

    Ok(ScanResult { resources, entries, relations })
}

/// Deployer_path resolves the `spec.path`/`spec.source.path` field §4.8 rule 0 prefers over
/// labels, fetching the owning Kustomization/Application that `detect_ownership` only named.
async fn deployer_path(reader: &ClusterReader, owner: &Ownership) -> Result<Option<String>> {
    let (group, version, kind, field) = match owner.sub_type.as_deref() {
        Some("kustomization") => ("kustomize.toolkit.fluxcd.io", "v1", "Kustomization", "spec.path"),
        Some("application") => ("argoproj.io", "v1alpha1", "Application", "spec.source.path"),
        _ => return Ok(None),
    };
    let deployer = reader.get_opt(group, version, kind, Some(&owner.namespace), &owner.name).await?;
    Ok(deployer.and_then(|d| d.field(field)).and_then(|v| v.as_str().map(str::to_string)))
}
