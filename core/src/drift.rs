//! Drift Detector (C5, §4.5): structural compare of a live [`Resource`] against its embedded
//! `kubectl.kubernetes.io/last-applied-configuration` snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{Resource, ResourceId};

const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// Change is one `(Path, Declared, Live)` entry from §3; `None` means "absent on that side".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    pub declared: Option<Value>,
    pub live: Option<Value>,
}

/// DriftedResource is `(Resource, Changes[])` from §3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftedResource {
    pub id: ResourceId,
    pub changes: Vec<Change>,
}

impl DriftedResource {
    pub fn has_drift(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Detect_drift implements §4.5. Returns `None` when the resource carries no last-applied
/// annotation ("no drift detectable", not an error, not drift) or when that annotation does
/// not parse as JSON (`serialization_error` policy in §7: "no drift" with a diagnostic change).
pub fn detect_drift(resource: &Resource) -> Option<DriftedResource> {
    let raw = resource.last_applied_configuration()?;
    let declared: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(resource = %resource.id(), error = %e, "last-applied-configuration is not valid JSON");
            return Some(DriftedResource { id: resource.id(), changes: Vec::new() });
        }
    };
    let live = resource.data();

    let mut changes = Vec::new();
    compare(&declared, &live, String::new(), &mut changes);
    Some(DriftedResource { id: resource.id(), changes })
}

fn is_ignored(path: &str) -> bool {
    const EXACT: &[&str] = &[
        "metadata.resourceVersion",
        "metadata.uid",
        "metadata.generation",
        "metadata.creationTimestamp",
        "metadata.selfLink",
        "metadata.annotations.kubectl.kubernetes.io/last-applied-configuration",
    ];
    const PREFIXES: &[&str] = &["metadata.managedFields", "status"];
    EXACT.contains(&path) || PREFIXES.iter().any(|p| path == *p || path.starts_with(&format!("{p}.")))
}

fn compare(declared: &Value, live: &Value, path: String, out: &mut Vec<Change>) {
    if is_ignored(&path) {
        return;
    }

    match (declared, live) {
        (Value::Object(d), Value::Object(l)) => {
            let mut keys: Vec<&String> = d.keys().chain(l.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child_path = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                if is_ignored(&child_path) {
                    continue;
                }
                match (d.get(key), l.get(key)) {
                    (Some(dv), Some(lv)) => compare(dv, lv, child_path, out),
                    (Some(dv), None) => out.push(Change { path: child_path, declared: Some(dv.clone()), live: None }),
                    (None, Some(lv)) => out.push(Change { path: child_path, declared: None, live: Some(lv.clone()) }),
                    (None, None) => unreachable!("key came from one of the two maps"),
                }
            }
        }
        (Value::Array(d), Value::Array(l)) => {
            if d.len() != l.len() {
                out.push(Change { path, declared: Some(declared.clone()), live: Some(live.clone()) });
            } else {
                for (i, (dv, lv)) in d.iter().zip(l.iter()).enumerate() {
                    compare(dv, lv, format!("{path}[{i}]"), out);
                }
            }
        }
        _ => {
            if !scalars_equal(declared, live) {
                out.push(Change { path, declared: Some(declared.clone()), live: Some(live.clone()) });
            }
        }
    }
}

/// Scalars_equal applies §4.5's numeric coercion: `3` and `3.0` compare equal.
fn scalars_equal(a: &Value, b: &Value) -> bool {
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a == b;
    }
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{resource, with_annotations};

    fn deployment_with_replicas(declared: i64, live: i64) -> Resource {
        let last_applied = serde_json::json!({
            "spec": {"replicas": declared},
        })
        .to_string();
        with_annotations(
            resource(
                "default",
                "apps",
                "v1",
                "Deployment",
                "frontend",
                serde_json::json!({"spec": {"replicas": live}}),
            ),
            &[(LAST_APPLIED_ANNOTATION, &last_applied)],
        )
    }

    #[test]
    fn reports_replica_drift() {
        let drifted = detect_drift(&deployment_with_replicas(2, 3)).unwrap();
        assert_eq!(drifted.changes.len(), 1);
        assert_eq!(drifted.changes[0].path, "spec.replicas");
        assert_eq!(drifted.changes[0].declared, Some(serde_json::json!(2)));
        assert_eq!(drifted.changes[0].live, Some(serde_json::json!(3)));
    }

    #[test]
    fn no_annotation_means_no_drift_detectable() {
        let r = resource("default", "apps", "v1", "Deployment", "frontend", serde_json::json!({}));
        assert!(detect_drift(&r).is_none());
    }

    #[test]
    fn ignored_paths_never_surface() {
        let drifted = detect_drift(&deployment_with_replicas(3, 3)).unwrap();
        assert!(drifted.changes.is_empty());
    }

    #[test]
    fn numeric_coercion_treats_int_and_float_as_equal() {
        let last_applied = serde_json::json!({"spec": {"replicas": 3.0}}).to_string();
        let r = with_annotations(
            resource("default", "apps", "v1", "Deployment", "frontend", serde_json::json!({"spec": {"replicas": 3}})),
            &[(LAST_APPLIED_ANNOTATION, &last_applied)],
        );
        assert!(!detect_drift(&r).unwrap().has_drift());
    }
}
