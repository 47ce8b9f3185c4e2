//! Cluster Reader (C1, §4.1): read-only dynamic access to the cluster API. Lists/gets arbitrary
//! `GroupVersionResource`s, caching discovery for the lifetime of one [`ClusterReader`].

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use kube::api::{Api, DynamicObject, ListParams};
use kube::core::GroupVersionKind;
use kube::discovery::{ApiCapabilities, ApiResource, Discovery, Scope};
use kube::Client;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::resource::Resource;
use crate::{Error, Result};

/// Scope narrows a [`ClusterReader::list`] call (§4.1 contract).
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub namespace: Option<String>,
    pub kinds: Option<Vec<String>>,
}

/// The kinds scanned by default absent an explicit [`Scope::kinds`] (§6 "Scanned resource set").
pub const DEFAULT_SCAN_KINDS: &[&str] = &[
    "Deployment",
    "ReplicaSet",
    "StatefulSet",
    "DaemonSet",
    "Pod",
    "Service",
    "ConfigMap",
    "Secret",
    "Ingress",
    "GitRepository",
    "Kustomization",
    "HelmRelease",
    "Application",
];

/// ClusterReader is C1: the only component that talks to the Kubernetes API server for reads.
/// Holds a discovery cache behind a read/write lock, per §5 "Shared-resource policy".
pub struct ClusterReader {
    client: Client,
    cluster_name: String,
    discovery: RwLock<Option<Arc<Discovery>>>,
}

impl ClusterReader {
    pub fn new(client: Client, cluster_name: impl Into<String>) -> Self {
        Self { client, cluster_name: cluster_name.into(), discovery: RwLock::new(None) }
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Refresh_discovery forces the next [`ClusterReader::resolve`] to re-run API discovery,
    /// e.g. after a CRD is installed mid-session (SPEC_FULL.md §2, discovery-cache invalidation).
    pub async fn refresh_discovery(&self) {
        *self.discovery.write().await = None;
    }

    async fn discovery(&self) -> Result<Arc<Discovery>> {
        if let Some(d) = self.discovery.read().await.clone() {
            return Ok(d);
        }
        let mut guard = self.discovery.write().await;
        if let Some(d) = guard.clone() {
            return Ok(d);
        }
        debug!("running API discovery");
        let discovery = Discovery::new(self.client.clone())
            .run()
            .await
            .map_err(classify)?;
        let discovery = Arc::new(discovery);
        *guard = Some(discovery.clone());
        Ok(discovery)
    }

    /// Resolve looks up the (ApiResource, ApiCapabilities) for a `kind`, searching every
    /// discovered group (the caller does not always know the group up front, e.g. CLI `--kind`).
    async fn resolve(&self, kind: &str) -> Result<(ApiResource, ApiCapabilities)> {
        let discovery = self.discovery().await?;
        for group in discovery.groups() {
            for (ar, caps) in group.recommended_resources() {
                if ar.kind.eq_ignore_ascii_case(kind) {
                    return Ok((ar, caps));
                }
            }
        }
        Err(Error::KindUnknown(kind.to_string()))
    }

    fn api_for(&self, ar: &ApiResource, caps: &ApiCapabilities, namespace: Option<&str>) -> Api<DynamicObject> {
        match (&caps.scope, namespace) {
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, ar),
            (Scope::Namespaced, None) => Api::all_with(self.client.clone(), ar),
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), ar),
        }
    }

    /// List streams every [`Resource`] in `scope`. Unknown kinds are skipped (logged, not
    /// fatal); a kind forbidden by RBAC is also skipped with a warning (§4.1, §7).
    #[instrument(skip(self), fields(cluster = %self.cluster_name))]
    pub async fn list(&self, scope: &Scope) -> Result<Vec<Resource>> {
        let kinds: Vec<String> = match &scope.kinds {
            Some(kinds) => kinds.clone(),
            None => DEFAULT_SCAN_KINDS.iter().map(|s| s.to_string()).collect(),
        };

        let results = stream::iter(kinds)
            .map(|kind| self.list_kind(&kind, scope.namespace.as_deref()))
            .buffer_unordered(8)
            .collect::<Vec<_>>()
            .await;

        let mut out = Vec::new();
        for result in results {
            match result {
                Ok(resources) => out.extend(resources),
                Err(Error::KindUnknown(kind)) => debug!(kind, "kind not served by cluster, skipping"),
                Err(Error::Forbidden(kind)) => warn!(kind, "RBAC denied access to kind, skipping"),
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    async fn list_kind(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<Resource>> {
        let (ar, caps) = self.resolve(kind).await?;
        let api = self.api_for(&ar, &caps, namespace);
        let gvk = GroupVersionKind { group: ar.group.clone(), version: ar.version.clone(), kind: ar.kind.clone() };
        let objects = api.list(&ListParams::default()).await.map_err(classify)?;
        Ok(objects
            .items
            .into_iter()
            .map(|obj| Resource::new(self.cluster_name.clone(), gvk.clone(), obj))
            .collect())
    }

    /// Get fetches a single object by coordinates (§4.1 contract). Returns
    /// [`Error::NotFound`] rather than an `Option`, matching the error-kind table in §7 where
    /// `not_found` is a named, matchable variant (trace treats it as a broken link, not fatal).
    #[instrument(skip(self), fields(cluster = %self.cluster_name))]
    pub async fn get(&self, _group: &str, _version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Result<Resource> {
        let (ar, caps) = self.resolve(kind).await?;
        let api = self.api_for(&ar, &caps, namespace);
        let obj = api.get(name).await.map_err(classify)?;
        let gvk = GroupVersionKind { group: ar.group, version: ar.version, kind: ar.kind };
        Ok(Resource::new(self.cluster_name.clone(), gvk, obj))
    }

    /// Get_opt is [`ClusterReader::get`] with `not_found` folded into `None`, the shape C8's
    /// trace engine wants when walking a chain that may be broken.
    pub async fn get_opt(&self, group: &str, version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Result<Option<Resource>> {
        match self.get(group, version, kind, namespace, name).await {
            Ok(r) => Ok(Some(r)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn classify(e: kube::Error) -> Error {
    match &e {
        kube::Error::Api(resp) if resp.code == 403 => Error::Forbidden(resp.reason.clone()),
        kube::Error::Api(resp) if resp.code == 404 => Error::NotFound(resp.reason.clone()),
        _ => Error::Unreachable(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Request, Response, StatusCode};
    use kube::client::Body;

    #[test]
    fn default_scan_kinds_cover_the_spec_surface() {
        assert!(DEFAULT_SCAN_KINDS.contains(&"Deployment"));
        assert!(DEFAULT_SCAN_KINDS.contains(&"Kustomization"));
        assert!(DEFAULT_SCAN_KINDS.contains(&"Application"));
    }

    fn deployment_resource() -> ApiResource {
        ApiResource {
            group: "apps".to_string(),
            version: "v1".to_string(),
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            plural: "deployments".to_string(),
        }
    }

    fn status_error_body(status: StatusCode, reason: &str) -> Response<Body> {
        let body = serde_json::json!({
            "code": status.as_u16(),
            "status": "Failure",
            "reason": reason,
            "details": {},
        });
        Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    /// Drives one `GET` through a mock transport and returns the resulting `kube::Error`,
    /// mirroring the teacher's tower_test-based `Client::new` harness rather than mocking
    /// `Discovery`'s multi-endpoint protocol, which `classify` never touches.
    async fn mocked_get_error(status: StatusCode, reason: &'static str) -> kube::Error {
        let (mock_service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        let ar = deployment_resource();
        let api: Api<DynamicObject> = Api::namespaced_with(client, "default", &ar);

        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("reader did not call the mock transport");
            assert_eq!(request.method(), Method::GET);
            send.send_response(status_error_body(status, reason));
        });

        let err = api.get("frontend").await.expect_err("expected the mock transport to return an API error");
        server.await.expect("mock server task panicked");
        err
    }

    #[tokio::test]
    async fn classify_maps_forbidden_response_to_forbidden_error() {
        let err = mocked_get_error(StatusCode::FORBIDDEN, "Forbidden").await;
        assert!(matches!(classify(err), Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn classify_maps_not_found_response_to_not_found_error() {
        let err = mocked_get_error(StatusCode::NOT_FOUND, "NotFound").await;
        assert!(matches!(classify(err), Error::NotFound(_)));
    }
}
