//! # relink-sync
//!
//! Per-repository synchronization and reinstall.
//!
//! Call [`SyncEngine::sync`] to bring one repository up to date with its
//! upstream branch, or [`pipeline::run`] to process a list of repositories
//! sequentially or concurrently and collect a [`SyncReport`].

pub mod cancel;
pub mod cleaner;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod runner;

pub use cancel::Cancellation;
pub use cleaner::{FsCleaner, TreeCleaner};
pub use engine::{SyncEngine, SyncOutcome};
pub use error::SyncError;
pub use pipeline::{RepositoryReport, RunOptions, SyncReport};
pub use runner::{CommandRunner, ShellRunner};
