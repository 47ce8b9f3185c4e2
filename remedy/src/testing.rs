//! Fixture builders shared by this crate's unit tests.

use kube::Client;
use kubescout_core::ccve::{Finding, RemedyType, Severity};
use kubescout_core::resource::ResourceId;

pub const CLUSTER: &str = "test-cluster";

/// Unconnected_client builds a [`Client`] that never performs DNS/TLS until a request is
/// actually awaited, for tests that only exercise `Executor::can_execute`.
pub fn unconnected_client() -> Client {
    let cfg = kube::Config::new("http://127.0.0.1:0".parse().expect("valid url"));
    kube::Client::try_from(cfg).expect("client construction does not connect")
}

/// Finding builds a minimal Finding of the given remedy type, targeting a `Deployment/nginx` in
/// `default`, with one representative `kubectl patch` command.
pub fn finding(remedy_type: RemedyType) -> Finding {
    Finding {
        ccve: "CCVE-TEST-0001".to_string(),
        severity: Severity::Medium,
        resource: ResourceId {
            cluster: CLUSTER.to_string(),
            group: "apps".to_string(),
            version: "v1".to_string(),
            kind: "Deployment".to_string(),
            namespace: "default".to_string(),
            name: "nginx".to_string(),
        },
        namespace: "default".to_string(),
        remedy_type,
        commands: vec!["kubectl patch deployment nginx -p '{\"spec\":{\"replicas\":1}}'".to_string()],
        message: "test finding".to_string(),
        suggestion: "test suggestion".to_string(),
    }
}
