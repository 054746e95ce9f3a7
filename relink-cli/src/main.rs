//! relink — keep several working copies on their upstream branch and
//! reinstall dependencies when `package.json` changed.
//!
//! # Usage
//!
//! ```text
//! relink [--config <file>] [--name <name>] [--path <dir>] [--upstream <branch>]
//!        [--remote <remote>] [--link <pkg>...] [--post-install <cmd>]
//!        [--parallel | --fail-fast] [--timeout <secs>] [--json] [--dry-run]
//!        [--log-level trace|debug|info|warn|error|fatal|silent]
//! ```

mod logging;
mod report;
mod sync;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use sync::SyncArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "relink",
    version,
    about = "Checks out a branch, reinstalls node_modules and sets up provided links",
    long_about = None,
    after_help = "Options can also be provided in .relinkrc or under the `relink` key in package.json",
)]
struct Cli {
    #[command(flatten)]
    sync: SyncArgs,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.sync.run()
}
