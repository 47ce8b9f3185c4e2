//! RestartExecutor handles `RemedyType::Restart` (§4.9): "risk=medium, reversible=true via
//! rollout undo".

use kube::Client;
use kubescout_core::ccve::{Finding, RemedyType};

use crate::dynamic_api::snapshot_yaml;
use crate::executor::{BoxFuture, Executor};
use crate::executors::append_dry_run_flag;
use crate::options::{ActionOutcome, ExecuteOptions, RemedyResult};
use crate::plan::{Action, Plan, RiskLevel};
use crate::shell::run;

/// RestartExecutor shells out a rollout restart and records the matching `rollout undo` as the
/// `RemedyResult.rollback_cmd`, since a restart has no snapshot to re-apply — the rollback is an
/// operation, not a document.
pub struct RestartExecutor {
    client: Client,
}

impl RestartExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn rollback_command(finding: &Finding) -> String {
        format!(
            "kubectl rollout undo {}/{} -n {}",
            finding.resource.kind.to_lowercase(),
            finding.resource.name,
            finding.resource.namespace,
        )
    }
}

impl Executor for RestartExecutor {
    fn remedy_type(&self) -> RemedyType {
        RemedyType::Restart
    }

    fn can_execute(&self, finding: &Finding) -> bool {
        finding.remedy_type == RemedyType::Restart && !finding.commands.is_empty()
    }

    fn dry_run<'a>(&'a self, finding: &'a Finding) -> BoxFuture<'a, Plan> {
        Box::pin(async move {
            let diff_before = snapshot_yaml(&self.client, &finding.resource).await?;
            let actions = finding
                .commands
                .iter()
                .map(|command| Action {
                    description: format!("restart {}", finding.resource),
                    command: command.clone(),
                    diff_before: diff_before.clone(),
                    diff_after: None,
                })
                .collect();
            Ok(Plan { finding: finding.clone(), actions, reversible: true, risk: RiskLevel::Medium })
        })
    }

    fn execute<'a>(&'a self, finding: &'a Finding, options: &'a ExecuteOptions) -> BoxFuture<'a, RemedyResult> {
        Box::pin(async move {
            let mut outcomes = Vec::new();
            let mut success = true;
            for command in &finding.commands {
                let command = if options.dry_run { append_dry_run_flag(command) } else { command.clone() };
                let outcome = match run("restart workload", &command, options.timeout).await {
                    Ok(o) => o,
                    Err(e) if options.force => ActionOutcome {
                        description: "restart workload".to_string(),
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
            let rollback_cmd =
                (success && !options.dry_run && options.rollback).then(|| Self::rollback_command(finding));
            let message = format!("restarted {}", finding.resource);
            if !options.dry_run {
                crate::events::publish_execution(&self.client, finding, success, &message).await?;
            }
            Ok(RemedyResult { success, actions: outcomes, message, rollback_cmd })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_command_targets_rollout_undo() {
        let f = crate::testing::finding(RemedyType::Restart);
        let cmd = RestartExecutor::rollback_command(&f);
        assert_eq!(cmd, "kubectl rollout undo deployment/nginx -n default");
    }

    #[test]
    fn declines_findings_with_no_commands() {
        let executor = RestartExecutor::new(crate::testing::unconnected_client());
        let mut f = crate::testing::finding(RemedyType::Restart);
        f.commands.clear();
        assert!(!executor.can_execute(&f));
    }
}
