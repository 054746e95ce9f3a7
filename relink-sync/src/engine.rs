//! Per-repository sync-and-reinstall decision engine.
//!
//! ## Command sequence
//!
//! 1. `git fetch <remote>`
//! 2. `git rev-parse --abbrev-ref HEAD` — current branch
//! 3. `git branch --list <upstream>` — does the local branch exist?
//! 4. Branch absent: manifest range against the current branch, then
//!    `git checkout -b <upstream> <remote>/<upstream>`.
//!    Branch present: full and manifest ranges against `<upstream>`,
//!    `git checkout <upstream>` if not already on it, stop if the full range
//!    is empty, otherwise `git pull --ff-only`.
//! 5. Manifest range non-empty: remove `node_modules`, `npm install`,
//!    `npm link <name>` per configured link in order, then the post-install
//!    hook if any.
//!
//! Ranges are `git rev-list` output; empty output means no commits.

use std::fmt;

use relink_core::RepositoryDescriptor;
use serde::Serialize;

use crate::cleaner::{TreeCleaner, DEPENDENCY_DIR};
use crate::runner::CommandRunner;
use crate::{Cancellation, SyncError};

/// Dependency manifest whose history decides whether to reinstall.
pub const MANIFEST_FILE: &str = "package.json";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a repository sync ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncOutcome {
    /// Local upstream branch already matched the remote.
    UpToDate,
    /// Local upstream branch was missing and has been created from the remote.
    BranchCreated,
    /// Local upstream branch was fast-forwarded.
    Updated,
    /// The manifest changed; dependencies were reinstalled and relinked.
    Reinstalled,
    /// Switching to the upstream branch failed, usually local changes.
    AbortedDirtyWorktree,
    /// `pull --ff-only` failed; the local branch has diverged.
    AbortedNonFastforward,
}

impl SyncOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOutcome::UpToDate => "up-to-date",
            SyncOutcome::BranchCreated => "branch-created",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Reinstalled => "reinstalled",
            SyncOutcome::AbortedDirtyWorktree => "aborted-dirty-worktree",
            SyncOutcome::AbortedNonFastforward => "aborted-non-fastforward",
        }
    }

    /// The sync stopped early on a recoverable condition.
    pub fn is_aborted(self) -> bool {
        matches!(
            self,
            SyncOutcome::AbortedDirtyWorktree | SyncOutcome::AbortedNonFastforward
        )
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives one repository through the command sequence.
///
/// Holds no per-repository state, so one engine may sync several
/// repositories concurrently as long as their paths are disjoint.
pub struct SyncEngine<'a> {
    runner: &'a dyn CommandRunner,
    cleaner: &'a dyn TreeCleaner,
    cancel: &'a Cancellation,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        cleaner: &'a dyn TreeCleaner,
        cancel: &'a Cancellation,
    ) -> Self {
        Self {
            runner,
            cleaner,
            cancel,
        }
    }

    /// Sync `repo` with `<remote>/<upstream>`, reinstalling if the manifest changed.
    ///
    /// A dirty worktree or a diverged branch returns `Ok` with an aborted
    /// outcome, unless the run was cancelled while checkout or pull ran.
    /// Fetch, cleanup, install, link and hook failures return `Err`.
    pub async fn sync(&self, repo: &RepositoryDescriptor) -> Result<SyncOutcome, SyncError> {
        let name = repo.name.as_str();
        let upstream = repo.upstream.as_str();
        let tracking = repo.tracking_ref();

        tracing::debug!(repository = name; "starting work on {name} in {}", repo.path.display());

        self.cancel.check("fetch")?;
        self.run(repo, &format!("git fetch {}", repo.remote)).await?;

        let current = self.run(repo, "git rev-parse --abbrev-ref HEAD").await?;
        let current = current.trim();

        let local = self.run(repo, &format!("git branch --list {upstream}")).await?;

        let (outcome, manifest_range) = if is_empty_range(&local) {
            let manifest_range = self
                .run(
                    repo,
                    &format!("git rev-list {tracking}...{current} -- {MANIFEST_FILE}"),
                )
                .await?;

            self.cancel.check("checkout")?;
            self.run(repo, &format!("git checkout -b {upstream} {tracking}"))
                .await?;
            tracing::info!(repository = name; "checked out {upstream}");

            (SyncOutcome::BranchCreated, manifest_range)
        } else {
            let range = self
                .run(repo, &format!("git rev-list {tracking}...{upstream}"))
                .await?;
            let manifest_range = self
                .run(
                    repo,
                    &format!("git rev-list {tracking}...{upstream} -- {MANIFEST_FILE}"),
                )
                .await?;

            self.cancel.check("checkout")?;
            let on_upstream = current == upstream;
            if !on_upstream {
                if let Err(err) = self.run(repo, &format!("git checkout {upstream}")).await {
                    // Ctrl-C kills the child too; that is not a dirty worktree.
                    self.cancel.check("checkout")?;
                    tracing::error!(
                        repository = name;
                        "could not check out {upstream}, worktree has local changes; skipping ({err})"
                    );
                    return Ok(SyncOutcome::AbortedDirtyWorktree);
                }
            }

            let action = if on_upstream { "already on" } else { "updated to" };
            let state = if is_empty_range(&range) {
                "already up-to-date"
            } else {
                "updating HEAD"
            };
            tracing::info!(repository = name; "{action} {upstream}; {state}");

            if is_empty_range(&range) {
                return Ok(SyncOutcome::UpToDate);
            }

            tracing::debug!(repository = name; "Attempting to pull");
            if let Err(err) = self.run(repo, "git pull --ff-only").await {
                self.cancel.check("pull")?;
                tracing::error!(
                    repository = name;
                    "could not fast-forward {upstream} to {tracking}, local branch has diverged; skipping ({err})"
                );
                return Ok(SyncOutcome::AbortedNonFastforward);
            }

            (SyncOutcome::Updated, manifest_range)
        };

        if is_empty_range(&manifest_range) {
            return Ok(outcome);
        }

        self.cancel.check("reinstall")?;
        self.reinstall(repo).await?;
        self.post_install(repo).await?;
        Ok(SyncOutcome::Reinstalled)
    }

    /// Clean, install and relink. Not interrupted by cancellation once started.
    async fn reinstall(&self, repo: &RepositoryDescriptor) -> Result<(), SyncError> {
        let name = repo.name.as_str();
        tracing::info!(repository = name; "deleting {DEPENDENCY_DIR} and running npm install");

        self.cleaner.clean(repo).await?;
        self.run(repo, "npm install").await?;

        if repo.links.is_empty() {
            return Ok(());
        }
        tracing::info!(repository = name; "setting up links, {}", repo.links.join(" "));
        // Sequential: later links may depend on earlier ones.
        for link in &repo.links {
            self.run(repo, &format!("npm link {link}")).await?;
        }
        Ok(())
    }

    async fn post_install(&self, repo: &RepositoryDescriptor) -> Result<(), SyncError> {
        let Some(hook) = repo.post_install.as_deref() else {
            return Ok(());
        };
        tracing::info!(repository = repo.name.as_str(); "Running post install hook: {hook}");
        self.run(repo, hook).await?;
        Ok(())
    }

    async fn run(&self, repo: &RepositoryDescriptor, command: &str) -> Result<String, SyncError> {
        self.runner.run(repo, command).await
    }
}

/// Exact emptiness: whitespace-only output still counts as commits.
fn is_empty_range(output: &str) -> bool {
    output.is_empty()
}
