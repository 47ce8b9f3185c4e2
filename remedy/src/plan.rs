//! Plan is the dry-run shape C9 produces for a Finding (§4.9): a list of Actions plus a
//! reversibility/risk classification, computed without mutating anything.

use serde::{Deserialize, Serialize};

use kubescout_core::ccve::Finding;

/// RiskLevel classifies how dangerous executing a [`Plan`] is (§4.9).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Action is one step of a [`Plan`]: `(Description, Command, DiffBefore, DiffAfter)` (§4.9).
///
/// `diff_before`/`diff_after` are YAML snapshots of the target resource, populated when the
/// executor could read the resource ahead of time; `None` when the target does not exist yet
/// (e.g. a `TriggerAction` against a resource that was already deleted).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub description: String,
    pub command: String,
    pub diff_before: Option<String>,
    pub diff_after: Option<String>,
}

/// Plan is `(Finding, Actions[], Reversible, RiskLevel)` (§4.9).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub finding: Finding,
    pub actions: Vec<Action>,
    pub reversible: bool,
    pub risk: RiskLevel,
}
