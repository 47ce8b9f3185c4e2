//! Events publishes a [`kube::runtime::events::Event`] on every non-dry-run `Execute` call
//! (SPEC_FULL.md §2 "Structured event emission on remedy execution"), the same mechanism the
//! teacher uses for its own writes (`controller::Request::publish`). This gives the caller a
//! ready-made audit trail carrying the originating Finding's CCVE ID, satisfying §4.9's "every
//! Action carries its originating Finding ID; auditing is the caller's responsibility" without
//! the core needing its own audit log.

use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;

use kubescout_core::ccve::Finding;

use crate::Result;

const CONTROLLER_NAME: &str = "kubescout-remedy";

fn reporter() -> Reporter {
    Reporter { controller: CONTROLLER_NAME.to_string(), instance: std::env::var("HOSTNAME").ok() }
}

fn object_reference(finding: &Finding) -> ObjectReference {
    let id = &finding.resource;
    ObjectReference {
        api_version: Some(if id.group.is_empty() { id.version.clone() } else { format!("{}/{}", id.group, id.version) }),
        kind: Some(id.kind.clone()),
        name: Some(id.name.clone()),
        namespace: Some(id.namespace.clone()),
        ..Default::default()
    }
}

/// Publish_execution records one `Execute` outcome against its target resource, tagging the
/// event note with the Finding's CCVE ID so it is recoverable from the cluster's own Event
/// stream.
pub async fn publish_execution(client: &Client, finding: &Finding, success: bool, message: &str) -> Result<()> {
    let recorder = Recorder::new(client.clone(), reporter(), object_reference(finding));
    let event = Event {
        type_: if success { EventType::Normal } else { EventType::Warning },
        reason: "KubescoutRemedy".to_string(),
        note: Some(format!("[{}] {}", finding.ccve, message)),
        action: finding.remedy_type.to_string(),
        secondary: None,
    };
    recorder.publish(event).await?;
    Ok(())
}
