//! Dynamic_api resolves a mutating [`Api<DynamicObject>`] for a single Finding's target.
//!
//! This deliberately duplicates the small discovery lookup `kubescout_core::reader` performs
//! rather than depending on that crate's cache: the reader's discovery cache is scoped to a
//! read-only invocation (§5 "Shared-resource policy"), and this is the one place in the
//! workspace where reaching for a mutating verb is allowed at all (§4.9 "Safety rules").

use kube::api::{Api, DynamicObject};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery, Scope};
use kube::Client;

use kubescout_core::resource::ResourceId;
use kubescout_core::Error as CoreError;

use crate::Result;

/// Resolve_api looks up `id.kind` via one-shot API discovery and returns a scoped
/// `Api<DynamicObject>` for it. Each call re-runs discovery: remedy executions are rare
/// (human-triggered or CCVE-scan-triggered), so a cache would only add staleness risk for no
/// measurable benefit.
pub async fn resolve_api(client: &Client, id: &ResourceId) -> Result<Api<DynamicObject>> {
    let discovery = Discovery::new(client.clone())
        .run()
        .await
        .map_err(|e| CoreError::Unreachable(e.to_string()))?;

    let (ar, caps): (ApiResource, ApiCapabilities) = discovery
        .groups()
        .flat_map(|g| g.recommended_resources())
        .find(|(ar, _)| ar.kind.eq_ignore_ascii_case(&id.kind))
        .ok_or_else(|| CoreError::KindUnknown(id.kind.clone()))?;

    let api = match caps.scope {
        Scope::Namespaced if !id.namespace.is_empty() => {
            Api::namespaced_with(client.clone(), &id.namespace, &ar)
        }
        _ => Api::all_with(client.clone(), &ar),
    };
    Ok(api)
}

/// Snapshot_yaml fetches `id` and renders it as YAML, for use as a [`crate::plan::Action`]'s
/// `diff_before` or as the captured pre-delete document a rollback re-applies. `None` means the
/// object is already gone, which is a normal (not erroneous) outcome here.
pub async fn snapshot_yaml(client: &Client, id: &ResourceId) -> Result<Option<String>> {
    let api = resolve_api(client, id).await?;
    match api.get_opt(&id.name).await? {
        Some(obj) => Ok(Some(serde_yaml::to_string(&obj)?)),
        None => Ok(None),
    }
}
