//! Shell command execution.

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use relink_core::RepositoryDescriptor;
use tokio::process::Command;

use crate::error::{command_failed, SyncError};

/// Runs one command string with the repository path as working directory.
///
/// Returns raw standard output; callers trim where they compare.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, repo: &RepositoryDescriptor, command: &str) -> Result<String, SyncError>;
}

/// [`CommandRunner`] backed by the platform shell (`sh -c`, `cmd /C`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, repo: &RepositoryDescriptor, command: &str) -> Result<String, SyncError> {
        let name = repo.name.as_str();
        let output = match shell(command)
            .current_dir(&repo.path)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(repository = name; "{command} failed: {err}");
                return Err(command_failed(command, err.to_string()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::trace!(repository = name; "{command}: {stdout:?} {stderr:?}");

        if !output.status.success() {
            let message = failure_message(output.status, &stderr);
            tracing::warn!(repository = name; "{command} failed: {message}");
            return Err(command_failed(command, message));
        }
        Ok(stdout)
    }
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("{status}")
    } else {
        format!("{status}: {stderr}")
    }
}
