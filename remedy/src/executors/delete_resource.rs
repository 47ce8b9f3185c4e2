//! DeleteResourceExecutor handles `RemedyType::DeleteResource` (§4.9): "risk=high,
//! reversible=false" on its own, but this executor captures a pre-delete YAML snapshot as the
//! rollback document, which makes the operation reversible in practice as long as the caller
//! keeps `RemedyResult.rollback_cmd` around.

use kube::Client;
use kubescout_core::ccve::{Finding, RemedyType};

use crate::dynamic_api::snapshot_yaml;
use crate::executor::{BoxFuture, Executor};
use crate::executors::append_dry_run_flag;
use crate::options::{ActionOutcome, ExecuteOptions, RemedyResult};
use crate::plan::{Action, Plan, RiskLevel};
use crate::shell::run;

/// DeleteResourceExecutor shells out a delete command, after snapshotting the resource so a
/// rollback can re-create it with `kubectl apply -f -`.
pub struct DeleteResourceExecutor {
    client: Client,
}

impl DeleteResourceExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Executor for DeleteResourceExecutor {
    fn remedy_type(&self) -> RemedyType {
        RemedyType::DeleteResource
    }

    fn can_execute(&self, finding: &Finding) -> bool {
        finding.remedy_type == RemedyType::DeleteResource && !finding.commands.is_empty()
    }

    fn dry_run<'a>(&'a self, finding: &'a Finding) -> BoxFuture<'a, Plan> {
        Box::pin(async move {
            let diff_before = snapshot_yaml(&self.client, &finding.resource).await?;
            let actions = finding
                .commands
                .iter()
                .map(|command| Action {
                    description: format!("delete {}", finding.resource),
                    command: command.clone(),
                    diff_before: diff_before.clone(),
                    diff_after: None,
                })
                .collect();
            Ok(Plan { finding: finding.clone(), actions, reversible: diff_before_present(&actions), risk: RiskLevel::High })
        })
    }

    fn execute<'a>(&'a self, finding: &'a Finding, options: &'a ExecuteOptions) -> BoxFuture<'a, RemedyResult> {
        Box::pin(async move {
            let snapshot = snapshot_yaml(&self.client, &finding.resource).await?;

            let mut outcomes = Vec::new();
            let mut success = true;
            for command in &finding.commands {
                let command = if options.dry_run { append_dry_run_flag(command) } else { command.clone() };
                let outcome = match run("delete resource", &command, options.timeout).await {
                    Ok(o) => o,
                    Err(e) if options.force => ActionOutcome {
                        description: "delete resource".to_string(),
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

            let rollback_cmd = match (&snapshot, success, options.dry_run, options.rollback) {
                (Some(yaml), true, false, true) => {
                    Some(format!("cat <<'KUBESCOUT_EOF' | kubectl apply -f -\n{yaml}KUBESCOUT_EOF"))
                }
                _ => None,
            };
            let message = format!("deleted {}", finding.resource);
            if !options.dry_run {
                crate::events::publish_execution(&self.client, finding, success, &message).await?;
            }
            Ok(RemedyResult { success, actions: outcomes, message, rollback_cmd })
        })
    }
}

fn diff_before_present(actions: &[Action]) -> bool {
    actions.iter().any(|a| a.diff_before.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declines_findings_with_no_commands() {
        let executor = DeleteResourceExecutor::new(crate::testing::unconnected_client());
        let mut f = crate::testing::finding(RemedyType::DeleteResource);
        f.commands.clear();
        assert!(!executor.can_execute(&f));
    }

    #[test]
    fn accepts_delete_resource_findings_with_commands() {
        let executor = DeleteResourceExecutor::new(crate::testing::unconnected_client());
        assert!(executor.can_execute(&crate::testing::finding(RemedyType::DeleteResource)));
    }

    #[test]
    fn reversible_is_false_with_no_prior_snapshot() {
        assert!(!diff_before_present(&[Action {
            description: "x".into(),
            command: "x".into(),
            diff_before: None,
            diff_after: None,
        }]));
    }
}
