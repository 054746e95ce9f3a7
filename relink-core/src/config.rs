//! Configuration discovery, loading and validation.
//!
//! # Sources
//!
//! First match wins:
//!
//! 1. an explicit `--config <file>` (a missing file is an error)
//! 2. `.relinkrc` in the working directory or one of its ancestors
//! 3. the `relink` key of the nearest `package.json`
//! 4. an empty configuration (one repository at the working directory)
//!
//! A configuration is either a single repository object or an object with a
//! `repositories` array of them.
//!
//! Functions that depend on the working directory take it explicitly
//! (`*_at(cwd)`); only the binary reads `std::env::current_dir()`.

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{malformed, ConfigError};
use crate::types::{
    default_name, RepositoryDescriptor, RepositoryName, DEFAULT_REMOTE, DEFAULT_UPSTREAM,
};

/// Run-control file looked up in the working directory and its ancestors.
pub const RC_FILE: &str = ".relinkrc";

/// Manifest whose [`PACKAGE_KEY`] may carry the configuration.
pub const PACKAGE_JSON: &str = "package.json";

/// Key inside `package.json` holding relink configuration.
pub const PACKAGE_KEY: &str = "relink";

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Read and parse a JSON configuration file.
pub fn load_file(path: &Path) -> Result<Value, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Look for configuration starting at `cwd` and walking up.
///
/// Returns the path it was loaded from (if any) alongside the value. The
/// search stops at the first `package.json`, whether or not it carries a
/// [`PACKAGE_KEY`] entry.
pub fn discover_at(cwd: &Path) -> Result<(Option<PathBuf>, Value), ConfigError> {
    for dir in cwd.ancestors() {
        let rc = dir.join(RC_FILE);
        if rc.is_file() {
            return Ok((Some(rc.clone()), load_file(&rc)?));
        }
        let manifest = dir.join(PACKAGE_JSON);
        if manifest.is_file() {
            let mut package = load_file(&manifest)?;
            return match package.get_mut(PACKAGE_KEY).map(Value::take) {
                Some(section) => Ok((Some(manifest), section)),
                None => Ok((None, empty())),
            };
        }
    }
    Ok((None, empty()))
}

fn empty() -> Value {
    Value::Object(Map::new())
}

// ---------------------------------------------------------------------------
// 2. Command-line overrides
// ---------------------------------------------------------------------------

/// Single-repository fields supplied on the command line.
///
/// `None` leaves the loaded configuration untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub upstream: Option<String>,
    pub remote: Option<String>,
    pub links: Option<Vec<String>>,
    pub post_install: Option<String>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Write the set fields into the top level of `config`.
    ///
    /// Has no effect on configurations listing `repositories`; returns
    /// `false` in that case so the caller can warn about ignored flags.
    pub fn apply(&self, config: &mut Value) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(obj) = config.as_object_mut() else {
            return false;
        };
        if obj.get("repositories").is_some_and(|r| !r.is_null()) {
            return false;
        }
        let mut set = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                obj.insert(key.to_string(), value);
            }
        };
        set("name", self.name.clone().map(Value::String));
        set(
            "path",
            self.path
                .as_ref()
                .map(|p| Value::String(p.to_string_lossy().into_owned())),
        );
        set("upstream", self.upstream.clone().map(Value::String));
        set("remote", self.remote.clone().map(Value::String));
        set(
            "links",
            self.links
                .as_ref()
                .map(|l| Value::Array(l.iter().cloned().map(Value::String).collect())),
        );
        set("postInstall", self.post_install.clone().map(Value::String));
        true
    }
}

// ---------------------------------------------------------------------------
// 3. Validate
// ---------------------------------------------------------------------------

/// Validate `config` into descriptors, resolving relative paths against `cwd`.
///
/// A single-repository configuration yields exactly one descriptor. Fails
/// with [`ConfigError::Malformed`] naming the first offending field.
pub fn ensure_at(config: &Value, cwd: &Path) -> Result<Vec<RepositoryDescriptor>, ConfigError> {
    let Some(obj) = config.as_object() else {
        return Err(malformed("expected config to be an object"));
    };

    let descriptors = match obj.get("repositories") {
        None | Some(Value::Null) => vec![ensure_one(obj, None, cwd)?],
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry.as_object() {
                Some(repo) => ensure_one(repo, Some(index), cwd),
                None => Err(malformed(format!("expected repository[{index}] to be object"))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(malformed("expected repositories to be array")),
    };

    ensure_disjoint(&descriptors)?;
    Ok(descriptors)
}

/// Configuration after discovery, overrides and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// File the configuration was read from; `None` for flags-only runs.
    pub source: Option<PathBuf>,
    /// Overrides were given but the configuration lists `repositories`.
    pub overrides_ignored: bool,
    pub repositories: Vec<RepositoryDescriptor>,
}

/// Full resolution: load (explicit file or discovery), apply overrides, validate.
///
/// An explicit path is taken relative to `cwd`.
pub fn resolve_at(
    explicit: Option<&Path>,
    overrides: &Overrides,
    cwd: &Path,
) -> Result<Resolved, ConfigError> {
    let (source, mut config) = match explicit {
        Some(path) => {
            let path = cwd.join(path);
            let config = load_file(&path)?;
            (Some(path), config)
        }
        None => discover_at(cwd)?,
    };
    let overrides_ignored = !overrides.apply(&mut config);
    let repositories = ensure_at(&config, cwd)?;
    Ok(Resolved {
        source,
        overrides_ignored,
        repositories,
    })
}

fn ensure_one(
    repo: &Map<String, Value>,
    index: Option<usize>,
    cwd: &Path,
) -> Result<RepositoryDescriptor, ConfigError> {
    let key = match index {
        Some(i) => format!("repository[{i}]."),
        None => String::new(),
    };

    let path = match optional_string(repo, "path", &key)? {
        Some(p) => normalize(&cwd.join(p)),
        None => cwd.to_path_buf(),
    };
    let name = match optional_string(repo, "name", &key)? {
        Some(n) => RepositoryName::from(n),
        None => default_name(&path),
    };
    let upstream = optional_string(repo, "upstream", &key)?.unwrap_or(DEFAULT_UPSTREAM);
    let remote = optional_string(repo, "remote", &key)?.unwrap_or(DEFAULT_REMOTE);

    let links = match repo.get("links") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(j, link)| match link.as_str() {
                Some("") => Err(malformed(format!("expected {key}links[{j}] to be non-empty"))),
                Some(s) => Ok(s.to_string()),
                None => Err(malformed(format!("expected {key}links[{j}] to be string"))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(malformed(format!("expected {key}links to be array"))),
    };

    let post_install = match repo.get("postInstall") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(malformed(format!(
                "expected {key}postInstall to be a string"
            )))
        }
    };

    if std::fs::metadata(&path).is_err() {
        return Err(malformed(format!("can't access {}", path.display())));
    }

    Ok(RepositoryDescriptor {
        name,
        path,
        upstream: upstream.to_string(),
        remote: remote.to_string(),
        links,
        post_install,
    })
}

/// Drop `.` and fold `..` without touching the filesystem, so the base name
/// is the directory actually meant.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// A string field; `null` and `""` count as absent.
fn optional_string<'a>(
    repo: &'a Map<String, Value>,
    field: &str,
    key: &str,
) -> Result<Option<&'a str>, ConfigError> {
    match repo.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(malformed(format!("expected {key}{field} to be string"))),
    }
}

/// No two descriptors may share a working copy.
fn ensure_disjoint(descriptors: &[RepositoryDescriptor]) -> Result<(), ConfigError> {
    let canonical: Vec<PathBuf> = descriptors
        .iter()
        .map(|d| std::fs::canonicalize(&d.path).unwrap_or_else(|_| d.path.clone()))
        .collect();
    for (i, path) in canonical.iter().enumerate() {
        if let Some(first) = canonical[..i].iter().position(|p| p == path) {
            return Err(malformed(format!(
                "repository[{i}].path duplicates repository[{first}].path"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
