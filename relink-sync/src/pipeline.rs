//! Multi-repository orchestration used by the CLI.

use std::path::PathBuf;

use futures::future::join_all;
use relink_core::{RepositoryDescriptor, RepositoryName};

use crate::{Cancellation, CommandRunner, SyncEngine, SyncError, SyncOutcome, TreeCleaner};

/// How repositories are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Sync every repository at once on the current task.
    pub parallel: bool,
    /// Sequential mode only: stop after the first fatal failure.
    pub fail_fast: bool,
}

/// Result of syncing one repository.
#[derive(Debug)]
pub struct RepositoryReport {
    pub name: RepositoryName,
    pub path: PathBuf,
    pub result: Result<SyncOutcome, SyncError>,
}

impl RepositoryReport {
    pub fn is_fatal(&self) -> bool {
        self.result.is_err()
    }
}

/// Results for every repository in input order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub repositories: Vec<RepositoryReport>,
    /// Repositories never attempted because `fail_fast` stopped the run.
    pub skipped: Vec<RepositoryName>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = &RepositoryReport> {
        self.repositories.iter().filter(|r| r.is_fatal())
    }

    /// No repository hit a fatal error. Aborted outcomes still count as success.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Sync every repository and collect the results.
///
/// Never returns early on a repository failure unless `options.fail_fast`
/// is set in sequential mode; every fatal error is in the report.
pub async fn run(
    repositories: &[RepositoryDescriptor],
    runner: &dyn CommandRunner,
    cleaner: &dyn TreeCleaner,
    cancel: &Cancellation,
    options: RunOptions,
) -> SyncReport {
    let engine = SyncEngine::new(runner, cleaner, cancel);
    let mut report = SyncReport::default();

    if options.parallel {
        let results = join_all(repositories.iter().map(|repo| engine.sync(repo))).await;
        for (repo, result) in repositories.iter().zip(results) {
            report.repositories.push(finish(repo, result));
        }
        return report;
    }

    let mut pending = repositories.iter();
    for repo in pending.by_ref() {
        let entry = finish(repo, engine.sync(repo).await);
        let stop = entry.is_fatal() && options.fail_fast;
        report.repositories.push(entry);
        if stop {
            break;
        }
    }
    report.skipped = pending.map(|repo| repo.name.clone()).collect();
    report
}

fn finish(repo: &RepositoryDescriptor, result: Result<SyncOutcome, SyncError>) -> RepositoryReport {
    let name = repo.name.as_str();
    match &result {
        Ok(outcome) => tracing::debug!(repository = name; "finished: {outcome}"),
        Err(err) => tracing::error!(repository = name; "{err}"),
    }
    RepositoryReport {
        name: repo.name.clone(),
        path: repo.path.clone(),
        result,
    }
}
