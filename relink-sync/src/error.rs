//! Error types for relink-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from sync operations.
///
/// Every variant is fatal for the repository it occurred in. Dirty worktrees
/// and diverged branches are not errors; they surface as
/// [`crate::SyncOutcome`] values.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A subprocess could not be spawned or exited non-zero.
    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    /// The dependency directory could not be removed.
    #[error("rm -Rf {path} failed: {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled (Ctrl-C or deadline) between two steps.
    #[error("cancelled before {step}")]
    Cancelled { step: &'static str },
}

/// Convenience constructor for [`SyncError::CommandFailed`].
pub(crate) fn command_failed(command: &str, message: impl Into<String>) -> SyncError {
    SyncError::CommandFailed {
        command: command.to_string(),
        message: message.into(),
    }
}
