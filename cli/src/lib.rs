#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

//! Kubescout-cli wires the six public entry points named in spec §9 "Design notes — External
//! collaborators" (enumerate entries with a query filter, trace a target forward/reverse, detect
//! drift on a target, list dangling refs in scope, emit a GSF document, feed Findings to a
//! remedy executor) to a `clap` binary, following the teacher's `controller/src/main.rs`
//! scaffolding (tracing-subscriber setup, a Prometheus introspection listener, a
//! `CancellationToken` for graceful shutdown).
//!
//! This is deliberately *not* the full CLI/TUI surface spec.md's Non-goals exclude — no color
//! tables, wizards, or shell completion, just JSON/YAML in, JSON/YAML out.

pub mod commands;
pub mod output;
pub mod scan;
pub mod watch;

/// Error is the error type surfaced by this binary's command implementations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Core wraps a failure from the read-only analytical engine.
    #[error("core error: {0}")]
    Core(#[from] kubescout_core::Error),
    /// Remedy wraps a failure from the bounded remedy executor.
    #[error("remedy error: {0}")]
    Remedy(#[from] kubescout_remedy::Error),
    /// Kube is a generic error from the `kube` crate (config inference, client construction).
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
    /// KubeConfig indicates the process was unable to find or parse a kubeconfig.
    #[error("kubeconfig error: {0}")]
    KubeConfig(#[from] kube::config::KubeconfigError),
    /// InferConfig indicates kubeconfig/in-cluster inference failed outright — the `2` exit
    /// code's "no cluster connection" case (§6 "Exit codes").
    #[error("kubeconfig inference error: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),
    /// Io covers reading a `--findings` file or writing formatted output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Json indicates a JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Yaml indicates a YAML (de)serialization failure.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Usage indicates a CLI argument was malformed (e.g. an unparsable `--target`).
    #[error("usage error: {0}")]
    Usage(String),
}

impl Error {
    /// Exit_code maps this error onto the exit codes §6 specifies: `1` for an ordinary command
    /// failure, `2` for "no cluster connection".
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InferConfig(_) => 2,
            Error::Kube(kube::Error::Service(_)) => 2,
            Error::Core(kubescout_core::Error::Unreachable(_)) => 2,
            _ => 1,
        }
    }
}

/// Result is the typedef for this binary's command implementations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
