//! The `relink` run: resolve configuration, sync every repository, report.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use env_logger::Target;
use relink_core::config::{self, Overrides};
use relink_core::RepositoryDescriptor;
use relink_sync::{pipeline, Cancellation, FsCleaner, RunOptions, ShellRunner, SyncReport};
use tokio::task::JoinHandle;

use crate::logging::{self, LogFormat, LogLevel};
use crate::report;

/// Arguments for `relink`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// JSON config file; defaults to .relinkrc or package.json's `relink` key.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name to use in logging [default: base name of the path].
    #[arg(short, long)]
    pub name: Option<String>,

    /// Working copy to sync [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Upstream branch to pull [default: master].
    #[arg(short, long, value_name = "BRANCH")]
    pub upstream: Option<String>,

    /// Remote to pull from [default: origin].
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Packages to `npm link` after install, in order.
    #[arg(short = 'l', long = "link", value_name = "PACKAGE", num_args = 1..)]
    pub links: Vec<String>,

    /// Shell command to run after a reinstall.
    #[arg(long, value_name = "COMMAND")]
    pub post_install: Option<String>,

    /// Logging level to use [default: info, or RUST_LOG].
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Sync all repositories at once.
    #[arg(long)]
    pub parallel: bool,

    /// Stop at the first repository that fails.
    #[arg(long, conflicts_with = "parallel")]
    pub fail_fast: bool,

    /// Stop starting new steps after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Validate the configuration and print the repositories without syncing.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<ExitCode> {
        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let resolved = config::resolve_at(self.config.as_deref(), &self.overrides(), &cwd)?;
        let repositories = resolved.repositories;

        // Machine-readable output owns stdout.
        let target = if self.json || self.dry_run {
            Target::Stderr
        } else {
            Target::Stdout
        };
        logging::init(
            self.log_level,
            LogFormat::for_repositories(&repositories),
            target,
        );
        match &resolved.source {
            Some(source) => log::debug!("started, config path: {}", source.display()),
            None => log::debug!("started"),
        }
        if resolved.overrides_ignored {
            log::warn!("config lists repositories; ignoring per-repository flags");
        }
        log::trace!("Running with config: {repositories:?}");

        if self.dry_run {
            println!(
                "{}",
                serde_json::to_string_pretty(&repositories).context("failed to render config")?
            );
            return Ok(ExitCode::SUCCESS);
        }

        let options = RunOptions {
            parallel: self.parallel,
            fail_fast: self.fail_fast,
        };
        let timeout = self.timeout.map(Duration::from_secs);
        let sync_report = execute(&repositories, options, timeout)?;

        if self.json {
            report::print_json(&sync_report)?;
        } else {
            report::print_table(&sync_report);
        }

        Ok(if sync_report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            name: self.name.clone(),
            path: self.path.clone(),
            upstream: self.upstream.clone(),
            remote: self.remote.clone(),
            links: (!self.links.is_empty()).then(|| self.links.clone()),
            post_install: self.post_install.clone(),
        }
    }
}

/// Run the pipeline on a single-threaded runtime, wiring Ctrl-C and the
/// optional deadline to the cancellation flag.
fn execute(
    repositories: &[RepositoryDescriptor],
    options: RunOptions,
    timeout: Option<Duration>,
) -> Result<SyncReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let cancel = Cancellation::new();

    let report = runtime.block_on(async {
        cancel_when(&cancel, interrupted(), "received ctrl-c".to_string());
        if let Some(limit) = timeout {
            cancel_when(
                &cancel,
                deadline(limit),
                format!("timeout of {}s reached", limit.as_secs()),
            );
        }
        pipeline::run(repositories, &ShellRunner, &FsCleaner, &cancel, options).await
    });
    Ok(report)
}

/// Trip `cancel` once `trigger` resolves to `true`.
fn cancel_when<F>(cancel: &Cancellation, trigger: F, reason: String) -> JoinHandle<()>
where
    F: Future<Output = bool> + Send + 'static,
{
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if trigger.await {
            log::warn!("{reason}, stopping after the current step");
            cancel.cancel();
        }
    })
}

async fn interrupted() -> bool {
    tokio::signal::ctrl_c().await.is_ok()
}

async fn deadline(limit: Duration) -> bool {
    tokio::time::sleep(limit).await;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn deadline_trips_cancellation_after_the_limit() {
        let cancel = Cancellation::new();
        let started = Instant::now();

        let handle = cancel_when(&cancel, deadline(Duration::from_secs(30)), "timeout".into());
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!cancel.is_cancelled());

        handle.await.unwrap();
        assert!(cancel.is_cancelled());
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn failed_trigger_leaves_the_run_alone() {
        let cancel = Cancellation::new();
        cancel_when(&cancel, async { false }, "ctrl-c".into())
            .await
            .unwrap();
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn trigger_cancels_every_clone() {
        let cancel = Cancellation::new();
        let observer = cancel.clone();
        cancel_when(&cancel, async { true }, "ctrl-c".into())
            .await
            .unwrap();
        assert!(observer.is_cancelled());
        assert!(observer.check("fetch").is_err());
    }
}
