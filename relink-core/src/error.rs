//! Error types for relink-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read (missing, permission denied, etc.).
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error on load — includes file path and line context from serde_json.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration parsed but does not describe valid repositories.
    ///
    /// `detail` names the offending field, prefixed with `repository[<i>].`
    /// when the field lives inside the `repositories` list.
    #[error("config is malformed, {detail}")]
    Malformed { detail: String },
}

pub(crate) fn malformed(detail: impl Into<String>) -> ConfigError {
    ConfigError::Malformed {
        detail: detail.into(),
    }
}
