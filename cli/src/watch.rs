//! Watch is the continuous alternative to a one-shot [`crate::commands::gsf`] invocation: a
//! `kube::runtime::watcher` stream per default scan kind (§6 "Scanned resource set"), re-running
//! the C1→C6 scan and re-emitting a GSF document on every event batch. This is additive — §1's
//! Non-goals never require the core to be single-shot — and off by default behind `--watch`.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use kube::api::{Api, DynamicObject};
use kube::discovery::Discovery;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use kubescout_core::config::ScanConfig;
use kubescout_core::reader::DEFAULT_SCAN_KINDS;

use crate::Result;

/// DEBOUNCE coalesces bursts of watch events (e.g. an initial relist) into one rescan.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Run drives `on_scan` once at startup and again after every debounced batch of cluster
/// changes across the default scan kinds, until `cancel` fires. `on_scan` closes over whatever
/// `ClusterReader` it needs to re-run its own scan; this function only needs `config` for
/// namespace scoping of the watch streams themselves.
pub async fn run<F, Fut>(client: Client, config: &ScanConfig, cancel: CancellationToken, mut on_scan: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    on_scan().await?;

    let discovery = Discovery::new(client.clone()).run().await?;
    let namespace = config.scope.namespace.as_deref();
    let mut apis = Vec::new();
    for kind in DEFAULT_SCAN_KINDS {
        match resolve(&discovery, &client, kind, namespace) {
            Some(api) => apis.push(api),
            None => warn!(kind, "kind not served by this cluster's discovery, skipping watch"),
        }
    }

    let merged = stream::select_all(
        apis.into_iter()
            .map(|api| watcher(api, watcher::Config::default()).default_backoff().touched_objects().boxed()),
    );

    tokio::pin!(merged);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("watch cancelled, stopping");
                return Ok(());
            }
            event = merged.next() => {
                match event {
                    Some(Ok(_)) => {
                        tokio::time::sleep(DEBOUNCE).await;
                        while let Ok(Some(Ok(_))) = tokio::time::timeout(Duration::from_millis(1), merged.next()).await {}
                        on_scan().await?;
                    }
                    Some(Err(e)) => warn!(error = %e, "watch stream error, continuing"),
                    None => {
                        info!("all watch streams ended");
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn resolve(discovery: &Discovery, client: &Client, kind: &str, namespace: Option<&str>) -> Option<Api<DynamicObject>> {
    for group in discovery.groups() {
        for (resource, _capabilities) in group.recommended_resources() {
            if resource.kind.eq_ignore_ascii_case(kind) {
                return Some(match namespace {
                    Some(ns) => Api::namespaced_with(client.clone(), ns, &resource),
                    None => Api::all_with(client.clone(), &resource),
                });
            }
        }
    }
    None
}
