#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

//! Core implements the read-only analytical engine that makes a GitOps-driven cluster legible:
//! ownership attribution, reference/dangling-reference analysis, drift detection, ownership
//! tracing, a query language and evaluator, and the CCVE scanner harness that feeds the remedy
//! subsystem in `kubescout-remedy`.
//!
//! Nothing in this crate calls a mutating cluster verb. That is a load-bearing property, not an
//! incidental one — see [`xtask::check::readonly_core`] in the workspace root for the static
//! check that enforces it.

pub mod ccve;
pub mod config;
pub mod dangling;
pub mod drift;
pub mod gsf;
pub mod mapentry;
pub mod ownership;
pub mod query;
pub mod reader;
pub mod reference;
pub mod resource;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;

/// Prelude is the common set of types most callers of this crate need.
pub mod prelude {
    pub use crate::config::ScanConfig;
    pub use crate::dangling::DanglingReference;
    pub use crate::drift::{Change, DriftedResource};
    pub use crate::gsf::GsfDocument;
    pub use crate::mapentry::MapEntry;
    pub use crate::ownership::Ownership;
    pub use crate::query::Query;
    pub use crate::reader::ClusterReader;
    pub use crate::reference::Reference;
    pub use crate::resource::{Resource, ResourceId};
    pub use crate::trace::Trace;
    pub use crate::{Error, Result};
}

/// Error is the error type surfaced by every public entry point in this crate.
///
/// Variants map onto the error kinds enumerated in the design's error-handling table: most of
/// them are either `#[from]` wrappers around a dependency's own error type, or one of the
/// named kinds a caller is expected to match on (`Forbidden`, `KindUnknown`, `NotFound`, ...).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Kube is a generic error from the `kube` crate (covers `unreachable` once wrapped by
    /// [`Error::classify`]).
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
    /// KubeConfig indicates the process was unable to find or parse a kubeconfig.
    #[error("kubeconfig error: {0}")]
    KubeConfig(#[from] kube::config::KubeconfigError),
    /// InferConfig indicates kubeconfig/in-cluster inference failed outright.
    #[error("kubeconfig inference error: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),
    /// Json indicates a JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Unreachable indicates the cluster API could not be reached at all; fatal for the
    /// invocation (§7).
    #[error("cluster unreachable: {0}")]
    Unreachable(String),
    /// Forbidden indicates RBAC denied access to a resource kind; the caller should warn and
    /// continue, omitting the affected kind (§7).
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// KindUnknown indicates a GroupVersionResource is not served by this cluster; callers skip
    /// it silently (§7).
    #[error("kind not served by cluster: {0}")]
    KindUnknown(String),
    /// NotFound indicates a `Get` targeted a missing object; surfaced to trace as a broken link
    /// rather than as a hard failure.
    #[error("not found: {0}")]
    NotFound(String),
    /// ParseError indicates the query grammar (§4.7) failed to parse.
    #[error("parse error: {0}")]
    ParseError(String),
    /// InvalidRegex indicates a `~=` right-hand side did not compile as a regular expression.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
    /// SerializationError indicates the inbound last-applied-configuration annotation was not
    /// valid JSON; drift detection treats this as "no drift detectable", not a hard error, but
    /// callers that want the diagnostic can match on this variant.
    #[error("last-applied-configuration is not valid JSON: {0}")]
    SerializationError(String),
    /// Cancelled indicates a cancellation token fired mid-operation; partial results
    /// accumulated in a single buffer are discarded by the caller (§5).
    #[error("operation cancelled")]
    Cancelled,
}

/// Result is the typedef for core operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
