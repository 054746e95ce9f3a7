//! Recording test double standing in for both the shell and the filesystem.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use relink_core::RepositoryDescriptor;
use relink_sync::{
    cleaner::dependency_dir, Cancellation, CommandRunner, SyncError, TreeCleaner,
};

/// Scripted reply for one command.
#[derive(Debug, Clone)]
enum Reply {
    Stdout(String),
    Fail(String),
}

/// Records every command (and cleanup as `rm -Rf <dir>`) in call order.
///
/// Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<(String, String)>>,
    replies: HashMap<(Option<String>, String), Reply>,
    cancel_after: Option<(String, Cancellation)>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` prints `stdout` in every repository.
    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.replies
            .insert((None, command.to_string()), Reply::Stdout(stdout.to_string()));
        self
    }

    /// `command` prints `stdout` in the repository called `repo` only.
    pub fn respond_in(mut self, repo: &str, command: &str, stdout: &str) -> Self {
        self.replies.insert(
            (Some(repo.to_string()), command.to_string()),
            Reply::Stdout(stdout.to_string()),
        );
        self
    }

    /// `command` exits non-zero in every repository.
    pub fn fail(mut self, command: &str) -> Self {
        self.replies
            .insert((None, command.to_string()), Reply::Fail("exit status: 1".into()));
        self
    }

    /// `command` exits non-zero in the repository called `repo` only.
    pub fn fail_in(mut self, repo: &str, command: &str) -> Self {
        self.replies.insert(
            (Some(repo.to_string()), command.to_string()),
            Reply::Fail("exit status: 1".into()),
        );
        self
    }

    /// Trip `cancel` once `command` has completed.
    pub fn cancel_after(mut self, command: &str, cancel: &Cancellation) -> Self {
        self.cancel_after = Some((command.to_string(), cancel.clone()));
        self
    }

    /// Every recorded command, all repositories interleaved.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Recorded commands for the repository called `repo`.
    pub fn commands_in(&self, repo: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == repo)
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn record(&self, repo: &RepositoryDescriptor, command: String) {
        self.calls
            .lock()
            .unwrap()
            .push((repo.name.0.clone(), command));
    }

    fn reply(&self, repo: &RepositoryDescriptor, command: &str) -> Option<Reply> {
        self.replies
            .get(&(Some(repo.name.0.clone()), command.to_string()))
            .or_else(|| self.replies.get(&(None, command.to_string())))
            .cloned()
    }
}

#[async_trait]
impl CommandRunner for Recorder {
    async fn run(&self, repo: &RepositoryDescriptor, command: &str) -> Result<String, SyncError> {
        self.record(repo, command.to_string());
        // Let concurrently polled syncs interleave.
        tokio::task::yield_now().await;
        if let Some((trigger, cancel)) = &self.cancel_after {
            if trigger == command {
                cancel.cancel();
            }
        }
        match self.reply(repo, command) {
            None => Ok(String::new()),
            Some(Reply::Stdout(out)) => Ok(out),
            Some(Reply::Fail(message)) => Err(SyncError::CommandFailed {
                command: command.to_string(),
                message,
            }),
        }
    }
}

#[async_trait]
impl TreeCleaner for Recorder {
    async fn clean(&self, repo: &RepositoryDescriptor) -> Result<(), SyncError> {
        self.record(repo, rm(&repo.path));
        Ok(())
    }
}

/// How the recorder writes a cleanup of `path`.
pub fn rm(path: &Path) -> String {
    format!("rm -Rf {}", dependency_dir(path).display())
}

/// The repository most scenarios use: `dummy` at `here`, two links.
pub fn dummy() -> RepositoryDescriptor {
    let mut repo = RepositoryDescriptor::new("here");
    repo.name = "dummy".into();
    repo.links = vec!["module-1".into(), "module-2".into()];
    repo
}
