//! Commands implements the six public entry points §9 "External collaborators" lists, each as a
//! thin function over [`kubescout_core`]/[`kubescout_remedy`] that this binary's `main.rs` calls
//! from its `clap` subcommand handlers.

use kubescout_core::ccve::Finding;
use kubescout_core::config::ScanConfig;
use kubescout_core::dangling::{find_dangling, DanglingReference};
use kubescout_core::drift::{detect_drift, DriftedResource};
use kubescout_core::gsf::{encode, GsfDocument};
use kubescout_core::mapentry::MapEntry;
use kubescout_core::query::Query;
use kubescout_core::reader::ClusterReader;
use kubescout_core::trace::{forward_trace, reverse_trace, Trace};
use kubescout_remedy::executor::Registry;
use kubescout_remedy::options::{ExecuteOptions, RemedyResult};

use crate::{Error, Result};

/// TargetRef names one resource by its full coordinates — the CLI has no discovery-backed
/// shorthand (`kind` alone, no group/version) the way `kubectl` does, since resolving that
/// ambiguity is exactly what [`ClusterReader::get`]'s explicit arguments avoid.
#[derive(Clone, Debug)]
pub struct TargetRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl std::str::FromStr for TargetRef {
    type Err = Error;

    /// Parses `group/version/kind/namespace/name`, with `group` empty for core/v1 kinds
    /// (e.g. `/v1/Service/default/api`, `apps/v1/Deployment/boutique/frontend`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        let [group, version, kind, namespace, name] = parts[..] else {
            return Err(Error::Usage(format!(
                "expected --target in the form group/version/kind/namespace/name, got {s:?}"
            )));
        };
        Ok(Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            name: name.to_string(),
        })
    }
}

/// (a) Enumerate entries with a query filter: one C1→C6 scan, then §4.7 evaluation over it.
pub async fn list_entries(reader: &ClusterReader, config: &ScanConfig, query: &str) -> Result<Vec<MapEntry>> {
    let scan = crate::scan::scan(reader, config).await?;
    let query = Query::parse(query)?;
    Ok(scan.entries.into_iter().filter(|e| query.matches(e)).collect())
}

/// (b) Trace a target forward or reverse.
pub async fn trace(reader: &ClusterReader, target: &TargetRef, reverse: bool) -> Result<Trace> {
    let resource = reader
        .get(&target.group, &target.version, &target.kind, target.namespace.as_deref(), &target.name)
        .await?;
    if reverse {
        Ok(reverse_trace(reader, &resource).await?)
    } else {
        Ok(forward_trace(reader, &resource).await?)
    }
}

/// (c) Detect drift on a target.
pub async fn drift(reader: &ClusterReader, target: &TargetRef) -> Result<Option<DriftedResource>> {
    let resource = reader
        .get(&target.group, &target.version, &target.kind, target.namespace.as_deref(), &target.name)
        .await?;
    Ok(detect_drift(&resource))
}

/// (d) List dangling refs in scope.
pub async fn dangling(reader: &ClusterReader, config: &ScanConfig) -> Result<Vec<DanglingReference>> {
    let resources = reader.list(&config.scope).await?;
    Ok(find_dangling(&resources))
}

/// (e) Emit a GSF document for the configured scope.
pub async fn gsf(reader: &ClusterReader, config: &ScanConfig, generated_at: impl Into<String>) -> Result<GsfDocument> {
    let scan = crate::scan::scan(reader, config).await?;
    Ok(encode(reader.cluster_name().to_string(), generated_at, scan.entries, scan.relations))
}

/// (f) Feed Findings to the remedy executor registry, one [`RemedyResult`] (or propagated error)
/// per finding, in the order given.
pub async fn remedy(registry: &Registry, findings: &[Finding], options: &ExecuteOptions) -> Result<Vec<RemedyResult>> {
    let mut results = Vec::with_capacity(findings.len());
    for finding in findings {
        let executor = registry.executor_for(finding)?;
        results.push(executor.execute(finding, options).await?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ref_parses_namespaced_coordinates() {
        let t: TargetRef = "apps/v1/Deployment/boutique/frontend".parse().unwrap();
        assert_eq!(t.group, "apps");
        assert_eq!(t.kind, "Deployment");
        assert_eq!(t.namespace.as_deref(), Some("boutique"));
        assert_eq!(t.name, "frontend");
    }

    #[test]
    fn target_ref_allows_empty_group_for_core_kinds() {
        let t: TargetRef = "/v1/Service/default/api".parse().unwrap();
        assert_eq!(t.group, "");
        assert_eq!(t.kind, "Service");
    }

    #[test]
    fn target_ref_rejects_malformed_input() {
        assert!("Deployment/frontend".parse::<TargetRef>().is_err());
    }
}
