//! GSF Encoder (C10, §6): serializes `(entries, relations, summary)` into the stable external
//! "GSF" JSON document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mapentry::MapEntry;
use crate::reference::Reference;

/// GsfDocument is the `gsf/v1` document shape from §6.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GsfDocument {
    pub version: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub cluster: String,
    pub entries: Vec<MapEntry>,
    pub relations: Vec<Reference>,
    pub summary: Summary,
}

/// Summary is the `summary` block from §6.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    #[serde(rename = "byKind")]
    pub by_kind: BTreeMap<String, usize>,
    #[serde(rename = "byOwner")]
    pub by_owner: BTreeMap<String, usize>,
    pub drifted: usize,
}

impl Summary {
    fn from_entries(entries: &[MapEntry]) -> Self {
        let mut by_kind = BTreeMap::new();
        let mut by_owner = BTreeMap::new();
        let mut drifted = 0;
        for entry in entries {
            *by_kind.entry(entry.kind.clone()).or_insert(0) += 1;
            let owner_key = entry
                .owner
                .as_ref()
                .map(|o| o.owner_type.display_name().to_string())
                .unwrap_or_else(|| "Native".to_string());
            *by_owner.entry(owner_key).or_insert(0) += 1;
            if entry.drift.is_some() {
                drifted += 1;
            }
        }
        Self { total: entries.len(), by_kind, by_owner, drifted }
    }
}

/// Encode builds a [`GsfDocument`] from a snapshot's entries and (optionally empty, per §6)
/// relations. `generated_at` is supplied by the caller (an RFC3339 timestamp) since this crate
/// never calls a wall-clock API directly — see SPEC_FULL.md's ambient-stack section.
pub fn encode(cluster: impl Into<String>, generated_at: impl Into<String>, entries: Vec<MapEntry>, relations: Vec<Reference>) -> GsfDocument {
    let summary = Summary::from_entries(&entries);
    GsfDocument { version: "gsf/v1".to_string(), generated_at: generated_at.into(), cluster: cluster.into(), entries, relations, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapentry::Status;
    use crate::ownership::{OwnerType, Ownership};
    use std::collections::BTreeMap as Map;

    fn entry(kind: &str, owner_type: OwnerType) -> MapEntry {
        MapEntry {
            id: format!("cluster/default/apps/{kind}/x"),
            cluster: "cluster".to_string(),
            namespace: "default".to_string(),
            kind: kind.to_string(),
            name: "x".to_string(),
            api_version: "apps/v1".to_string(),
            owner: Some(Ownership { owner_type, sub_type: None, name: String::new(), namespace: String::new() }),
            deployer: None,
            labels: Map::new(),
            drift: None,
            variant: None,
            status: Status::Ready,
            confighub: None,
            ccves: Vec::new(),
        }
    }

    #[test]
    fn summary_counts_by_kind_and_owner() {
        let doc = encode("kind", "2024-01-01T00:00:00Z", vec![entry("Deployment", OwnerType::Flux), entry("Service", OwnerType::Flux)], Vec::new());
        assert_eq!(doc.summary.total, 2);
        assert_eq!(doc.summary.by_kind.get("Deployment"), Some(&1));
        assert_eq!(doc.summary.by_owner.get("Flux"), Some(&2));
        assert_eq!(doc.version, "gsf/v1");
    }
}
