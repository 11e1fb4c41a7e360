use super::{with_timeout, ProbeOptions};
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs a local command; healthy when it exits with status 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecCheck {
    /// Program followed by its arguments. Not passed through a shell.
    #[serde(default)]
    pub command: Vec<String>,
}

impl ExecCheck {
    pub async fn healthy(&self, options: &ProbeOptions) -> bool {
        let Some((program, args)) = self.command.split_first() else {
            debug!("Empty exec command, not probing");
            return false;
        };

        // Output is captured so the command never writes to our own stdout.
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match with_timeout(options.timeout, output).await {
            Some(Ok(output)) if output.status.success() => {
                debug!(command = ?self.command, "Exec probe succeeded");
                true
            }
            Some(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!(
                    command = ?self.command,
                    status = %output.status,
                    stderr = %stderr.trim_end(),
                    "Exec probe exited unsuccessfully",
                );
                false
            }
            Some(Err(err)) => {
                debug!(command = ?self.command, %err, "Unable to run exec probe");
                false
            }
            None => {
                debug!(command = ?self.command, timeout = ?options.timeout, "Exec probe timed out");
                false
            }
        }
    }
}
