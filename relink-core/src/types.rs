//! Domain types for relink.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Branch pulled when none is configured.
pub const DEFAULT_UPSTREAM: &str = "master";

/// Remote fetched from when none is configured.
pub const DEFAULT_REMOTE: &str = "origin";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed display name for a repository; used to tag log output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryName(pub String);

impl RepositoryName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Width in characters, for log column alignment.
    pub fn width(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// RepositoryDescriptor
// ---------------------------------------------------------------------------

/// A validated repository configuration.
///
/// Only [`crate::config`] constructs these from raw input; after that they
/// are read-only. `path` was accessible when the descriptor was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    pub name: RepositoryName,
    pub path: PathBuf,
    pub upstream: String,
    pub remote: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_install: Option<String>,
}

impl RepositoryDescriptor {
    /// Descriptor with default upstream/remote and no links, named after the
    /// last component of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: default_name(&path),
            path,
            upstream: DEFAULT_UPSTREAM.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            links: Vec::new(),
            post_install: None,
        }
    }

    /// `<remote>/<upstream>`, the remote-tracking ref the local branch follows.
    pub fn tracking_ref(&self) -> String {
        format!("{}/{}", self.remote, self.upstream)
    }
}

/// The base name of `path`, or the whole path when it has none (e.g. `/`).
pub fn default_name(path: &Path) -> RepositoryName {
    match path.file_name() {
        Some(name) => RepositoryName(name.to_string_lossy().into_owned()),
        None => RepositoryName(path.display().to_string()),
    }
}
