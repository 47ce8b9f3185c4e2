//! ScanConfig: per-invocation scoping and feature flags, read from the environment (SPEC_FULL.md
//! §1 "Configuration").

use crate::reader::Scope;

/// Environment variable overriding the cluster name reported in [`crate::resource::ResourceId`]
/// and the GSF document (§6 "Environment").
pub const CLUSTER_NAME_ENV: &str = "KUBESCOUT_CLUSTER_NAME";

/// ScanConfig controls the scope and optional (costly) features of one scan invocation (§4.6,
/// §5 "Scheduling model").
#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub cluster_name: String,
    pub scope: Scope,
    /// Drift detection is O(resources); gated behind a flag per §4.6.
    pub detect_drift: bool,
    /// Relation extraction (C3 union) is gated behind a flag per §4.6 "Relations:".
    pub extract_relations: bool,
}

impl ScanConfig {
    /// Cluster_name resolves the reported cluster name: [`CLUSTER_NAME_ENV`] if set, otherwise
    /// `fallback` (typically the current kubeconfig context name).
    pub fn cluster_name(fallback: impl Into<String>) -> String {
        std::env::var(CLUSTER_NAME_ENV).unwrap_or_else(|_| fallback.into())
    }

    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self { cluster_name: cluster_name.into(), scope: Scope::default(), detect_drift: false, extract_relations: false }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.scope.namespace = Some(namespace.into());
        self
    }

    pub fn with_kinds(mut self, kinds: Vec<String>) -> Self {
        self.scope.kinds = Some(kinds);
        self
    }

    pub fn with_drift(mut self, enabled: bool) -> Self {
        self.detect_drift = enabled;
        self
    }

    pub fn with_relations(mut self, enabled: bool) -> Self {
        self.extract_relations = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_scope_and_flags() {
        let cfg = ScanConfig::new("kind").with_namespace("boutique").with_drift(true);
        assert_eq!(cfg.scope.namespace.as_deref(), Some("boutique"));
        assert!(cfg.detect_drift);
        assert!(!cfg.extract_relations);
    }
}
