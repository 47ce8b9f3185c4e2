//! Executors is the workspace's only built-in set of [`crate::executor::Executor`]
//! implementations, one per auto-executable `RemedyType` (§4.9): config edit, trigger action,
//! restart, delete.
//!
//! The three advice-only remedy types (`DiagnoseThenFix`, `ExternalAction`, `SourceFix`) have no
//! executor here by design — §4.9 says they "require human action and only produce advice", so
//! [`crate::executor::Registry::executor_for`] correctly returns `executor_missing` for them
//! unless a caller registers its own.

mod config_fix;
mod delete_resource;
mod restart;
mod trigger_action;

pub use config_fix::ConfigFixExecutor;
pub use delete_resource::DeleteResourceExecutor;
pub use restart::RestartExecutor;
pub use trigger_action::TriggerActionExecutor;

/// Append_dry_run_flag adds a server-side dry-run flag to a `kubectl` command string, the
/// mechanism §4.9 names for making an `Execute(..., dry_run: true)` call "execute harmlessly"
/// (Testable Property 10) without special-casing every command shape.
pub(crate) fn append_dry_run_flag(command: &str) -> String {
    if command.trim_start().starts_with("kubectl") {
        format!("{command} --dry-run=server")
    } else {
        command.to_string()
    }
}
