#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

//! Remedy implements the bounded remedy executor (C9, spec §4.9): the only crate in this
//! workspace permitted to call a mutating cluster verb.
//!
//! `kubescout-core` is read-only by construction (see its crate docs); this crate takes a
//! [`kubescout_core::ccve::Finding`] and, through the [`Registry`], dispatches it to one of a
//! small set of [`Executor`]s that know how to produce a dry-run [`plan::Plan`] or actually
//! shell out and mutate the cluster.

pub mod executor;
pub mod executors;
pub mod options;
pub mod plan;

mod dynamic_api;
mod events;
mod shell;

#[cfg(test)]
pub(crate) mod testing;

/// Prelude is the common set of types most callers of this crate need.
pub mod prelude {
    pub use crate::executor::{Executor, Registry};
    pub use crate::options::{ActionOutcome, ExecuteOptions, RemedyResult};
    pub use crate::plan::{Action, Plan, RiskLevel};
    pub use crate::{Error, Result};
}

/// Error is the error type surfaced by every public entry point in this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Core wraps a failure from the read-only engine (e.g. resolving a dynamic API resource).
    #[error("core error: {0}")]
    Core(#[from] kubescout_core::Error),
    /// Kube is a generic error from the `kube` crate.
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
    /// Io indicates a shelled-out command could not even be spawned.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Json indicates a JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Yaml indicates a YAML serialization failure (rollback snapshots are captured as YAML).
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// ExecutorMissing indicates no executor is registered for a Finding's `RemedyType` (§7).
    #[error("no executor registered for remedy type {0:?}")]
    ExecutorMissing(kubescout_core::ccve::RemedyType),
    /// ExecutorRefused indicates a registered executor's `CanExecute` returned false (§7).
    #[error("executor for {0:?} refused this finding")]
    ExecutorRefused(kubescout_core::ccve::RemedyType),
    /// ActionTimeout indicates an Action exceeded its per-Action timeout (§7); execution halts
    /// unless `Force` was set.
    #[error("action {0:?} timed out")]
    ActionTimeout(String),
    /// Cancelled indicates a cancellation token fired mid-execution (§5).
    #[error("operation cancelled")]
    Cancelled,
}

/// Result is the typedef for remedy operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
