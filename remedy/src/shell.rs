//! Shell runs one Finding `Command` string as a subprocess with a per-Action timeout (§4.9,
//! §5 "Suspension points": "any remedy-side shelled command" may suspend).

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{instrument, warn};

use crate::options::ActionOutcome;
use crate::{Error, Result};

/// Run executes `command` through `sh -c`, bounded by `budget`. A command that exceeds the
/// budget yields [`Error::ActionTimeout`]; the caller decides whether that halts the batch
/// (non-`Force`) or is merely recorded (`Force`).
#[instrument(skip(budget), fields(command))]
pub async fn run(description: &str, command: &str, budget: Duration) -> Result<ActionOutcome> {
    let child = Command::new("sh").arg("-c").arg(command).output();
    let output = match timeout(budget, child).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(command, "action exceeded its timeout");
            return Err(Error::ActionTimeout(description.to_string()));
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        combined.push('\n');
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
    }

    Ok(ActionOutcome {
        description: description.to_string(),
        command: command.to_string(),
        success: output.status.success(),
        output: combined,
    })
}
