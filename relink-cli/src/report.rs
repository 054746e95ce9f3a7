//! End-of-run summary: a table for humans, JSON with `--json`.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use relink_sync::{RepositoryReport, SyncOutcome, SyncReport};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ReportTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "detail")]
    detail: String,
}

#[derive(Serialize)]
struct ReportJson {
    success: bool,
    repositories: Vec<RepositoryJson>,
    skipped: Vec<String>,
}

#[derive(Serialize)]
struct RepositoryJson {
    name: String,
    path: PathBuf,
    outcome: Option<SyncOutcome>,
    error: Option<String>,
}

pub fn print_table(report: &SyncReport) {
    if report.repositories.is_empty() && report.skipped.is_empty() {
        println!("No repositories configured.");
        return;
    }

    let mut rows: Vec<ReportTableRow> = report.repositories.iter().map(table_row).collect();
    rows.extend(report.skipped.iter().map(|name| ReportTableRow {
        repository: name.to_string(),
        outcome: "skipped".dimmed().to_string(),
        detail: "not attempted after an earlier failure".to_string(),
    }));

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let failed = report.failures().count();
    if failed == 0 {
        println!("{} all repositories synced", "✓".green());
    } else {
        println!("{} {failed} repositories failed", "✗".red());
    }
}

pub fn print_json(report: &SyncReport) -> Result<()> {
    let payload = ReportJson {
        success: report.is_success(),
        repositories: report
            .repositories
            .iter()
            .map(|r| RepositoryJson {
                name: r.name.to_string(),
                path: r.path.clone(),
                outcome: r.result.as_ref().ok().copied(),
                error: r.result.as_ref().err().map(ToString::to_string),
            })
            .collect(),
        skipped: report.skipped.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn table_row(entry: &RepositoryReport) -> ReportTableRow {
    let (outcome, detail) = match &entry.result {
        Ok(outcome) => (paint(*outcome), describe(*outcome).to_string()),
        Err(err) => ("failed".red().to_string(), err.to_string()),
    };
    ReportTableRow {
        repository: entry.name.to_string(),
        outcome,
        detail,
    }
}

fn paint(outcome: SyncOutcome) -> String {
    let text = outcome.as_str();
    if outcome.is_aborted() {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

fn describe(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::UpToDate => "nothing to do",
        SyncOutcome::BranchCreated => "created local branch from remote",
        SyncOutcome::Updated => "fast-forwarded",
        SyncOutcome::Reinstalled => "package.json changed; reinstalled and relinked",
        SyncOutcome::AbortedDirtyWorktree => "checkout blocked by local changes",
        SyncOutcome::AbortedNonFastforward => "local branch diverged from remote",
    }
}
