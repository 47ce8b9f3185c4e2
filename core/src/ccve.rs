//! CCVE Scanner Harness (C11, §4's "catalog of configuration anti-patterns"): drives a
//! pluggable set of pattern checks over entries/relations and emits [`Finding`]s.
//!
//! The individual patterns are explicitly out of scope (§1): this module owns only the
//! `Finding` shape and the driver that runs whatever checks a caller registers.

use serde::{Deserialize, Serialize};

use crate::mapentry::MapEntry;
use crate::reference::Reference;
use crate::resource::ResourceId;

/// Severity is the finding priority from §3.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// RemedyType is the dispatch key C9 (in `kubescout-remedy`) uses to pick an executor (§4.9).
/// Lives in the core because a [`Finding`] — a core entity — carries one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display, strum::EnumString)]
pub enum RemedyType {
    ConfigFix,
    TriggerAction,
    Restart,
    DeleteResource,
    DiagnoseThenFix,
    ExternalAction,
    SourceFix,
}

impl RemedyType {
    /// Auto_executable is the four types §4.9 says "the first four are auto-executable"; the
    /// remaining three are advice-only.
    pub fn auto_executable(self) -> bool {
        matches!(self, RemedyType::ConfigFix | RemedyType::TriggerAction | RemedyType::Restart | RemedyType::DeleteResource)
    }
}

/// Finding is `(CCVE, Severity, Resource, Namespace, RemedyType, Commands, Message, Suggestion)`
/// from §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Finding {
    pub ccve: String,
    pub severity: Severity,
    pub resource: ResourceId,
    pub namespace: String,
    pub remedy_type: RemedyType,
    pub commands: Vec<String>,
    pub message: String,
    pub suggestion: String,
}

/// PatternCheck is one named anti-pattern detector. Implementations are data-driven per §1
/// ("the core specifies only the shape of a finding and the executor dispatch, not the
/// individual patterns") — this crate ships none, callers register their own.
pub trait PatternCheck: Send + Sync {
    /// Id is the check's own identifying name, for logging; not necessarily the CCVE ID a
    /// single invocation emits (one check may emit several distinct CCVEs).
    fn id(&self) -> &str;

    /// Check scans `entries`/`relations` and returns zero or more findings.
    fn check(&self, entries: &[MapEntry], relations: &[Reference]) -> Vec<Finding>;
}

/// Scanner drives a registered set of [`PatternCheck`]s over one snapshot.
#[derive(Default)]
pub struct Scanner {
    checks: Vec<Box<dyn PatternCheck>>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: Box<dyn PatternCheck>) {
        self.checks.push(check);
    }

    /// Scan runs every registered check, swallowing no errors — pattern checks are pure
    /// functions over already-projected data, not I/O, so there is nothing to catch here.
    pub fn scan(&self, entries: &[MapEntry], relations: &[Reference]) -> Vec<Finding> {
        self.checks.iter().flat_map(|check| check.check(entries, relations)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapentry::Status;
    use std::collections::BTreeMap;

    struct AlwaysFlagsNative;
    impl PatternCheck for AlwaysFlagsNative {
        fn id(&self) -> &str {
            "always-flags-native"
        }
        fn check(&self, entries: &[MapEntry], _relations: &[Reference]) -> Vec<Finding> {
            entries
                .iter()
                .filter(|e| e.owner.as_ref().map(|o| o.owner_type.display_name() == "Native").unwrap_or(true))
                .map(|e| Finding {
                    ccve: "CCVE-TEST-0001".to_string(),
                    severity: Severity::Low,
                    resource: ResourceId { cluster: e.cluster.clone(), group: String::new(), version: "v1".into(), kind: e.kind.clone(), namespace: e.namespace.clone(), name: e.name.clone() },
                    namespace: e.namespace.clone(),
                    remedy_type: RemedyType::DiagnoseThenFix,
                    commands: Vec::new(),
                    message: "resource has no GitOps owner".to_string(),
                    suggestion: "bring it under GitOps management".to_string(),
                })
                .collect()
        }
    }

    #[test]
    fn scanner_runs_registered_checks() {
        let mut scanner = Scanner::new();
        scanner.register(Box::new(AlwaysFlagsNative));
        let entry = MapEntry {
            id: "cluster/default/apps/Deployment/debug".to_string(),
            cluster: "cluster".to_string(),
            namespace: "default".to_string(),
            kind: "Deployment".to_string(),
            name: "debug".to_string(),
            api_version: "apps/v1".to_string(),
            owner: Some(crate::ownership::Ownership {
                owner_type: crate::ownership::OwnerType::Unknown,
                sub_type: None,
                name: String::new(),
                namespace: String::new(),
            }),
            deployer: None,
            labels: BTreeMap::new(),
            drift: None,
            variant: None,
            status: Status::Unknown,
            confighub: None,
            ccves: Vec::new(),
        };
        let findings = scanner.scan(&[entry], &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].ccve, "CCVE-TEST-0001");
    }

    #[test]
    fn remedy_type_auto_executable_classification() {
        assert!(RemedyType::ConfigFix.auto_executable());
        assert!(!RemedyType::SourceFix.auto_executable());
    }
}
