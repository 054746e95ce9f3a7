//! relink core library — repository descriptors, configuration loading and
//! validation, errors.
//!
//! - [`types`] — newtypes and the validated [`RepositoryDescriptor`]
//! - [`error`] — [`ConfigError`]
//! - [`config`] — discover / load / validate

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{RepositoryDescriptor, RepositoryName};
