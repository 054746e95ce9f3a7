//! Dependency directory removal.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use relink_core::RepositoryDescriptor;

use crate::SyncError;

/// Directory holding installed dependencies, relative to the repository root.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// `<path>/node_modules`
pub fn dependency_dir(path: &Path) -> PathBuf {
    path.join(DEPENDENCY_DIR)
}

/// Removes a repository's dependency directory.
///
/// Must be idempotent: an already-missing directory is success.
#[async_trait]
pub trait TreeCleaner: Send + Sync {
    async fn clean(&self, repo: &RepositoryDescriptor) -> Result<(), SyncError>;
}

/// [`TreeCleaner`] using the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCleaner;

#[async_trait]
impl TreeCleaner for FsCleaner {
    async fn clean(&self, repo: &RepositoryDescriptor) -> Result<(), SyncError> {
        let name = repo.name.as_str();
        let dir = dependency_dir(&repo.path);
        tracing::trace!(repository = name; "rm -Rf {}", dir.display());
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                tracing::warn!(repository = name; "rm -Rf failed: {err}");
                Err(SyncError::CleanupFailed {
                    path: dir,
                    source: err,
                })
            }
        }
    }
}
