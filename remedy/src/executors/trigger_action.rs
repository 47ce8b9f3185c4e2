//! TriggerActionExecutor handles `RemedyType::TriggerAction` (§4.9): "risk=low, reversible=true".
//!
//! A trigger action is typically a reconciliation nudge (e.g. bumping Flux's
//! `reconcile.fluxcd.io/requestedAt` annotation) rather than a structural edit, but it shares
//! ConfigFix's shape closely enough that it gets its own thin executor rather than reusing
//! ConfigFixExecutor under a different name — §4.9 lists them as distinct remedy types with
//! distinct risk semantics, and a future divergence (e.g. trigger-specific cooldown) should not
//! have to first split them back apart.

use kube::Client;
use kubescout_core::ccve::{Finding, RemedyType};

use crate::dynamic_api::snapshot_yaml;
use crate::executor::{BoxFuture, Executor};
use crate::executors::append_dry_run_flag;
use crate::options::{ActionOutcome, ExecuteOptions, RemedyResult};
use crate::plan::{Action, Plan, RiskLevel};
use crate::shell::run;

/// TriggerActionExecutor shells out each of `Finding.commands` as a reconciliation trigger.
pub struct TriggerActionExecutor {
    client: Client,
}

impl TriggerActionExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Executor for TriggerActionExecutor {
    fn remedy_type(&self) -> RemedyType {
        RemedyType::TriggerAction
    }

    fn can_execute(&self, finding: &Finding) -> bool {
        finding.remedy_type == RemedyType::TriggerAction && !finding.commands.is_empty()
    }

    fn dry_run<'a>(&'a self, finding: &'a Finding) -> BoxFuture<'a, Plan> {
        Box::pin(async move {
            let diff_before = snapshot_yaml(&self.client, &finding.resource).await?;
            let actions = finding
                .commands
                .iter()
                .map(|command| Action {
                    description: format!("trigger reconciliation for {}", finding.resource),
                    command: command.clone(),
                    diff_before: diff_before.clone(),
                    diff_after: None,
                })
                .collect();
            Ok(Plan { finding: finding.clone(), actions, reversible: true, risk: RiskLevel::Low })
        })
    }

    fn execute<'a>(&'a self, finding: &'a Finding, options: &'a ExecuteOptions) -> BoxFuture<'a, RemedyResult> {
        Box::pin(async move {
            let mut outcomes = Vec::new();
            let mut success = true;
            for command in &finding.commands {
                let command = if options.dry_run { append_dry_run_flag(command) } else { command.clone() };
                let outcome = match run("trigger reconciliation", &command, options.timeout).await {
                    Ok(o) => o,
                    Err(e) if options.force => ActionOutcome {
                        description: "trigger reconciliation".to_string(),
                        command: command.clone(),
                        success: false,
                        output: e.to_string(),
                    },
                    Err(e) => return Err(e),
                };
                success &= outcome.success;
                let halt = !outcome.success && !options.force;
                outcomes.push(outcome);
                if halt {
                    break;
                }
            }
            let message = format!("triggered reconciliation for {}", finding.resource);
            if !options.dry_run {
                crate::events::publish_execution(&self.client, finding, success, &message).await?;
            }
            Ok(RemedyResult { success, actions: outcomes, message, rollback_cmd: None })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declines_findings_with_no_commands() {
        let executor = TriggerActionExecutor::new(crate::testing::unconnected_client());
        let mut f = crate::testing::finding(RemedyType::TriggerAction);
        f.commands.clear();
        assert!(!executor.can_execute(&f));
    }

    #[test]
    fn accepts_trigger_action_findings_with_commands() {
        let executor = TriggerActionExecutor::new(crate::testing::unconnected_client());
        assert!(executor.can_execute(&crate::testing::finding(RemedyType::TriggerAction)));
    }
}
