//! Execute options and results (§4.9 "Execute options"/"Result").

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// ExecuteOptions is `(DryRun, Force, Rollback, Timeout)` from §4.9.
///
/// `dry_run` here is distinct from [`crate::executor::Executor::dry_run`]: that method never
/// touches the cluster at all, while an `Execute` call with `dry_run: true` still shells out but
/// MUST do so harmlessly (e.g. a server-side dry-run flag), satisfying Testable Property 10.
#[derive(Clone, Copy, Debug)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    pub force: bool,
    pub rollback: bool,
    pub timeout: Duration,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            force: false,
            rollback: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// ActionOutcome pairs one executed [`crate::plan::Action`] with its observed output (§4.9
/// "Result: Actions[] with outputs").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub description: String,
    pub command: String,
    pub success: bool,
    pub output: String,
}

/// RemedyResult is `(Success, Actions[] with outputs, Message, RollbackCmd?)` from §4.9.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemedyResult {
    pub success: bool,
    pub actions: Vec<ActionOutcome>,
    pub message: String,
    pub rollback_cmd: Option<String>,
}
