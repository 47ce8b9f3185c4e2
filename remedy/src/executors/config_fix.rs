//! ConfigFixExecutor handles `RemedyType::ConfigFix` (§4.9): "risk=low, reversible=true".

use kube::Client;
use kubescout_core::ccve::{Finding, RemedyType};

use crate::dynamic_api::snapshot_yaml;
use crate::executor::{BoxFuture, Executor};
use crate::executors::append_dry_run_flag;
use crate::options::{ActionOutcome, ExecuteOptions, RemedyResult};
use crate::plan::{Action, Plan, RiskLevel};
use crate::shell::run;

/// ConfigFixExecutor shells out each of `Finding.commands` as a patch against the target
/// resource (e.g. `kubectl patch ...`); each command is its own [`Action`].
pub struct ConfigFixExecutor {
    client: Client,
}

impl ConfigFixExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Executor for ConfigFixExecutor {
    fn remedy_type(&self) -> RemedyType {
        RemedyType::ConfigFix
    }

    fn can_execute(&self, finding: &Finding) -> bool {
        finding.remedy_type == RemedyType::ConfigFix && !finding.commands.is_empty()
    }

    fn dry_run<'a>(&'a self, finding: &'a Finding) -> BoxFuture<'a, Plan> {
        Box::pin(async move {
            let diff_before = snapshot_yaml(&self.client, &finding.resource).await?;
            let actions = finding
                .commands
                .iter()
                .map(|command| Action {
                    description: format!("apply config fix for {}", finding.ccve),
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
                let outcome = match run(&format!("config fix ({})", finding.ccve), &command, options.timeout).await {
                    Ok(o) => o,
                    Err(e) if options.force => ActionOutcome {
                        description: finding.ccve.clone(),
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
            let message = if success {
                format!("applied config fix for {}", finding.ccve)
            } else {
                format!("config fix for {} failed", finding.ccve)
            };
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
    use kubescout_core::ccve::RemedyType;

    fn finding() -> Finding {
        crate::testing::finding(RemedyType::ConfigFix)
    }

    #[test]
    fn declines_findings_with_no_commands() {
        let executor = ConfigFixExecutor::new(crate::testing::unconnected_client());
        let mut f = finding();
        f.commands.clear();
        assert!(!executor.can_execute(&f));
    }

    #[test]
    fn accepts_config_fix_findings_with_commands() {
        let executor = ConfigFixExecutor::new(crate::testing::unconnected_client());
        assert!(executor.can_execute(&finding()));
    }
}
