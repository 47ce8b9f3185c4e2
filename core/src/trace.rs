//! Trace Engine (C8, §4.4): walks ownership chains forward (source → deployer → workload) and
//! reverse (pod → owners → controller → source).

use serde::{Deserialize, Serialize};

use crate::mapentry::Status;
use crate::ownership::{detect_ownership, Ownership, OwnerType};
use crate::reader::ClusterReader;
use crate::resource::{Resource, ResourceId};
use crate::Result;

/// Max nodes a [`Trace`] may contain (Testable Property 7).
pub const MAX_NODES: usize = 5;

/// TraceNode is one hop in a [`Trace`]: a resource (possibly unresolved) plus its readiness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceNode {
    pub id: ResourceId,
    pub role: String,
    pub status: Status,
    pub reason: Option<String>,
}

impl TraceNode {
    fn missing(id: ResourceId, role: &str) -> Self {
        Self { id, role: role.to_string(), status: Status::Unknown, reason: Some("not found".to_string()) }
    }
}

/// Trace is the ordered, root-to-leaf chain §4.4 describes, bounded to [`MAX_NODES`] and
/// guaranteed acyclic by construction (it only ever appends, never revisits).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trace {
    pub nodes: Vec<TraceNode>,
}

impl Trace {
    /// Status is the worst node status in the chain (§4.4 "Broken chain semantics").
    pub fn status(&self) -> Status {
        worst_status(self.nodes.iter().map(|n| n.status))
    }
}

/// Worst_status folds a list of normalized [`Status`] values by the fixed severity ordering
/// (`Failed > Suspended > OutOfSync > NotReady > Pending > Unknown > Ready`), generalizing the
/// teacher's `cmp_condition`/`merge_condition` helpers (SPEC_FULL.md §2 "`Condition`-shaped
/// trace/health surfacing") so CLI surfaces other than [`Trace`] (e.g. a watch-mode health
/// summary) can fold statuses the same way.
pub fn worst_status(statuses: impl IntoIterator<Item = Status>) -> Status {
    statuses.into_iter().max_by_key(severity_rank).unwrap_or(Status::Unknown)
}

fn severity_rank(status: &Status) -> u8 {
    match status {
        Status::Ready => 0,
        Status::Unknown => 1,
        Status::Pending => 2,
        Status::NotReady => 3,
        Status::OutOfSync => 4,
        Status::Suspended => 5,
        Status::Failed => 6,
    }
}

/// Forward_trace answers "what deployed this?" (§4.4 steps 1-6).
pub async fn forward_trace(reader: &ClusterReader, target: &Resource) -> Result<Trace> {
    let owner = detect_ownership(target);
    let mut nodes = match (owner.owner_type, owner.sub_type.as_deref()) {
        (OwnerType::Flux, Some("kustomization")) => flux_kustomization_chain(reader, &owner).await?,
        (OwnerType::Flux, Some("helmrelease")) => flux_helmrelease_chain(reader, &owner).await?,
        (OwnerType::Argo, _) => argo_chain(reader, &owner).await?,
        (OwnerType::Helm, _) => helm_chain(reader, &owner).await?,
        // §4.4 step 6: no GitOps owner found is a single-node chain, not a prefix to the
        // workload node appended below — the node built here already *is* the workload.
        _ => {
            let mut node = workload_node(target);
            node.reason = Some("No GitOps owner found".to_string());
            return Ok(Trace { nodes: vec![node] });
        }
    };

    nodes.push(workload_node(target));
    nodes.truncate(MAX_NODES);
    Ok(Trace { nodes })
}

async fn flux_kustomization_chain(reader: &ClusterReader, owner: &Ownership) -> Result<Vec<TraceNode>> {
    let Some(kustomization) = reader
        .get_opt("kustomize.toolkit.fluxcd.io", "v1", "Kustomization", Some(&owner.namespace), &owner.name)
        .await?
    else {
        return Ok(vec![TraceNode::missing(
            ResourceId {
                cluster: reader.cluster_name().to_string(),
                group: "kustomize.toolkit.fluxcd.io".to_string(),
                version: "v1".to_string(),
                kind: "Kustomization".to_string(),
                namespace: owner.namespace.clone(),
                name: owner.name.clone(),
            },
            "deployer",
        )]);
    };

    let mut nodes = Vec::new();
    if let Some(source) = source_ref_node(reader, &kustomization, "spec.sourceRef").await? {
        nodes.push(source);
    }
    nodes.push(node_for(&kustomization, "deployer"));
    Ok(nodes)
}

async fn flux_helmrelease_chain(reader: &ClusterReader, owner: &Ownership) -> Result<Vec<TraceNode>> {
    let Some(helmrelease) = reader
        .get_opt("helm.toolkit.fluxcd.io", "v2", "HelmRelease", Some(&owner.namespace), &owner.name)
        .await?
    else {
        return Ok(vec![TraceNode::missing(
            ResourceId {
                cluster: reader.cluster_name().to_string(),
                group: "helm.toolkit.fluxcd.io".to_string(),
                version: "v2".to_string(),
                kind: "HelmRelease".to_string(),
                namespace: owner.namespace.clone(),
                name: owner.name.clone(),
            },
            "deployer",
        )]);
    };

    let mut nodes = Vec::new();
    if let Some(source) = source_ref_node(reader, &helmrelease, "spec.chart.spec.sourceRef").await? {
        nodes.push(source);
    }
    nodes.push(node_for(&helmrelease, "deployer"));
    Ok(nodes)
}

async fn source_ref_node(reader: &ClusterReader, deployer: &Resource, path: &str) -> Result<Option<TraceNode>> {
    let Some(source_ref) = deployer.field(path) else {
        return Ok(None);
    };
    let (Some(kind), Some(name)) = (
        source_ref.get("kind").and_then(|v| v.as_str().map(str::to_string)),
        source_ref.get("name").and_then(|v| v.as_str().map(str::to_string)),
    ) else {
        return Ok(None);
    };
    let namespace = source_ref
        .get("namespace")
        .and_then(|v| v.as_str().map(str::to_string))
        .or_else(|| deployer.namespace())
        .unwrap_or_default();

    let source = reader
        .get_opt("source.toolkit.fluxcd.io", "v1", &kind, Some(&namespace), &name)
        .await?;
    Ok(Some(match source {
        Some(r) => node_for(&r, "source"),
        None => TraceNode::missing(
            ResourceId {
                cluster: reader.cluster_name().to_string(),
                group: "source.toolkit.fluxcd.io".to_string(),
                version: "v1".to_string(),
                kind,
                namespace,
                name,
            },
            "source",
        ),
    }))
}

async fn argo_chain(reader: &ClusterReader, owner: &Ownership) -> Result<Vec<TraceNode>> {
    let Some(app) = reader
        .get_opt("argoproj.io", "v1alpha1", "Application", Some(&owner.namespace), &owner.name)
        .await?
    else {
        return Ok(vec![TraceNode::missing(
            ResourceId {
                cluster: reader.cluster_name().to_string(),
                group: "argoproj.io".to_string(),
                version: "v1alpha1".to_string(),
                kind: "Application".to_string(),
                namespace: owner.namespace.clone(),
                name: owner.name.clone(),
            },
            "deployer",
        )]);
    };

    let mut nodes = Vec::new();
    if let Some(repo_url) = app.field("spec.source.repoUrl").and_then(|v| v.as_str().map(str::to_string)) {
        nodes.push(TraceNode {
            id: ResourceId {
                cluster: reader.cluster_name().to_string(),
                group: String::new(),
                version: String::new(),
                kind: "Repo".to_string(),
                namespace: String::new(),
                name: repo_url,
            },
            role: "source".to_string(),
            status: Status::Unknown,
            reason: None,
        });
    }
    nodes.push(node_for(&app, "deployer"));
    Ok(nodes)
}

async fn helm_chain(reader: &ClusterReader, owner: &Ownership) -> Result<Vec<TraceNode>> {
    let secrets = reader
        .list(&crate::reader::Scope { namespace: Some(owner.namespace.clone()), kinds: Some(vec!["Secret".to_string()]) })
        .await?;
    let release = secrets
        .iter()
        .filter(|s| s.label("owner") == Some("helm") && s.label("name") == Some(owner.name.as_str()))
        .max_by_key(|s| s.label("version").and_then(|v| v.parse::<u32>().ok()).unwrap_or(0));

    let mut nodes = Vec::new();
    nodes.push(TraceNode {
        id: ResourceId {
            cluster: reader.cluster_name().to_string(),
            group: String::new(),
            version: String::new(),
            kind: "HelmChart".to_string(),
            namespace: owner.namespace.clone(),
            name: owner.name.clone(),
        },
        role: "source".to_string(),
        status: Status::Unknown,
        reason: None,
    });
    nodes.push(match release {
        Some(secret) => node_for(secret, "deployer"),
        None => TraceNode::missing(
            ResourceId {
                cluster: reader.cluster_name().to_string(),
                group: String::new(),
                version: "v1".to_string(),
                kind: "Secret".to_string(),
                namespace: owner.namespace.clone(),
                name: format!("sh.helm.release.v1.{}", owner.name),
            },
            "deployer",
        ),
    });
    Ok(nodes)
}

fn node_for(resource: &Resource, role: &str) -> TraceNode {
    TraceNode {
        id: resource.id(),
        role: role.to_string(),
        status: node_status(resource),
        reason: None,
    }
}

fn workload_node(resource: &Resource) -> TraceNode {
    TraceNode { id: resource.id(), role: "workload".to_string(), status: node_status(resource), reason: None }
}

fn node_status(resource: &Resource) -> Status {
    let conditions = resource.field("status.conditions");
    let Some(conditions) = conditions.as_ref().and_then(|v| v.as_array()) else {
        return Status::Unknown;
    };
    match conditions.iter().find(|c| c.get("type").and_then(|t| t.as_str()) == Some("Ready")) {
        Some(c) if c.get("status").and_then(|s| s.as_str()) == Some("True") => Status::Ready,
        Some(c) if c.get("reason").and_then(|r| r.as_str()) == Some("Suspended") => Status::Suspended,
        Some(_) => Status::Failed,
        None => Status::Pending,
    }
}

/// Reverse_trace answers "what owns this?" by walking `metadata.ownerReferences` upward
/// (Pod → ReplicaSet → Deployment), then running [`forward_trace`] on the root (§4.4).
pub async fn reverse_trace(reader: &ClusterReader, start: &Resource) -> Result<Trace> {
    let mut upward = vec![workload_node(start)];
    let mut current = start.clone();

    while upward.len() < MAX_NODES {
        let Some(owner_ref) = current.owner_references().first().cloned() else {
            break;
        };
        let (group, version) = owner_ref
            .api_version
            .split_once('/')
            .map(|(g, v)| (g.to_string(), v.to_string()))
            .unwrap_or_else(|| (String::new(), owner_ref.api_version.clone()));
        let Some(owner) = reader
            .get_opt(&group, &version, &owner_ref.kind, current.namespace().as_deref(), &owner_ref.name)
            .await?
        else {
            upward.push(TraceNode::missing(
                ResourceId {
                    cluster: reader.cluster_name().to_string(),
                    group,
                    version,
                    kind: owner_ref.kind,
                    namespace: current.namespace_str(),
                    name: owner_ref.name,
                },
                "owner",
            ));
            break;
        };
        upward.push(node_for(&owner, "owner"));
        current = owner;
    }

    let forward = forward_trace(reader, &current).await?;
    let mut nodes = forward.nodes;
    // `current`'s own node is already the last entry forward_trace appended; splice the
    // ownerReference climb in front of it without duplicating that shared node.
    upward.pop();
    nodes.splice(0..0, upward);
    nodes.truncate(MAX_NODES);
    Ok(Trace { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::resource;

    #[test]
    fn status_is_worst_of_nodes() {
        let trace = Trace {
            nodes: vec![
                TraceNode { id: ResourceId::default(), role: "source".into(), status: Status::Ready, reason: None },
                TraceNode { id: ResourceId::default(), role: "deployer".into(), status: Status::Failed, reason: None },
            ],
        };
        assert_eq!(trace.status(), Status::Failed);
    }

    #[test]
    fn bounded_to_max_nodes() {
        let nodes: Vec<_> = (0..10)
            .map(|_| TraceNode { id: ResourceId::default(), role: "owner".into(), status: Status::Ready, reason: None })
            .collect();
        let mut trace = Trace { nodes };
        trace.nodes.truncate(MAX_NODES);
        assert!(trace.nodes.len() <= MAX_NODES);
    }

    #[test]
    fn severity_rank_orders_the_middle_values() {
        // Exercises the ordering stated in `worst_status`'s doc comment beyond the Ready/Failed
        // extremes: Failed > Suspended > OutOfSync > NotReady > Pending > Unknown > Ready.
        assert!(severity_rank(&Status::Suspended) > severity_rank(&Status::OutOfSync));
        assert!(severity_rank(&Status::OutOfSync) > severity_rank(&Status::NotReady));
        assert!(severity_rank(&Status::NotReady) > severity_rank(&Status::Pending));
        assert!(severity_rank(&Status::Pending) > severity_rank(&Status::Unknown));
        assert!(severity_rank(&Status::Unknown) > severity_rank(&Status::Ready));
    }

    #[test]
    fn worst_status_prefers_not_ready_over_pending() {
        assert_eq!(worst_status([Status::Pending, Status::NotReady]), Status::NotReady);
        assert_eq!(worst_status([Status::NotReady, Status::OutOfSync]), Status::OutOfSync);
        assert_eq!(worst_status([Status::OutOfSync, Status::Suspended]), Status::Suspended);
    }

    #[tokio::test]
    async fn forward_trace_native_owner_is_a_single_node() {
        let (mock_service, _handle) =
            tower_test::mock::pair::<http::Request<kube::client::Body>, http::Response<kube::client::Body>>();
        let client = kube::Client::new(mock_service, "default");
        let reader = ClusterReader::new(client, crate::testing::CLUSTER);

        let target = resource("default", "apps", "v1", "Deployment", "frontend", serde_json::json!({}));
        let trace = forward_trace(&reader, &target)
            .await
            .expect("forward_trace must not touch the reader for a native-owned resource");

        assert_eq!(trace.nodes.len(), 1);
        assert_eq!(trace.nodes[0].role, "workload");
        assert_eq!(trace.nodes[0].id.name, "frontend");
        assert_eq!(trace.nodes[0].reason.as_deref(), Some("No GitOps owner found"));
    }
}
