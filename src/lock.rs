//! # Lock Document Model
//!
//! This module loads the declarative lock document that pins every vendored
//! dependency. The document maps a dependency name to its source URL, pinned
//! revision and checkout path:
//!
//! ```json
//! {
//!   "repos": {
//!     "client": {
//!       "url": "https://example.com/client.git",
//!       "rev": "3f2a9c1d",
//!       "path": "src/client"
//!     }
//!   }
//! }
//! ```
//!
//! The same shape is accepted as YAML (`.yaml`, `.yml`) or TOML (`.toml`);
//! anything else is read as JSON. Entries keep their document order, which is
//! the order `sync` and `apply` process them in.
//!
//! The model is read-only. Bumping a pinned revision is an edit to the lock
//! document itself and never happens as a side effect of harvesting.

use std::path::{Component, Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Default file name of the lock document inside the patch-management root.
pub const DEFAULT_LOCK_FILENAME: &str = "deps.lock.json";

/// One pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Unique key of the dependency; also names its patch directory.
    #[serde(skip)]
    pub name: String,
    /// Clone URL (anything `git clone` accepts, including local paths).
    pub url: String,
    /// Commit id or ref the checkout is pinned to.
    pub rev: String,
    /// Checkout location, relative to the checkout root.
    pub path: String,
}

impl DependencySpec {
    /// Absolute location of this dependency's checkout.
    pub fn checkout_dir(&self, checkout_root: &Path) -> PathBuf {
        checkout_root.join(&self.path)
    }
}

/// Serialization format of a lock document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockFormat {
    Json,
    Yaml,
    Toml,
}

impl LockFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => LockFormat::Yaml,
            Some("toml") => LockFormat::Toml,
            _ => LockFormat::Json,
        }
    }
}

/// The full set of pinned dependencies, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockFile {
    dependencies: Vec<DependencySpec>,
}

impl LockFile {
    /// Load and validate the lock document at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::LockNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, LockFormat::from_path(path), path)
    }

    /// Parse a lock document. `origin` is only used in error messages.
    pub fn parse(content: &str, format: LockFormat, origin: &Path) -> Result<Self> {
        let malformed = |message: String, hint: Option<&str>| Error::LockMalformed {
            path: origin.to_path_buf(),
            message,
            hint: hint.map(str::to_string),
        };

        // Going through serde_json::Value keeps entry order for every format.
        let document: Value = match format {
            LockFormat::Json => {
                serde_json::from_str(content).map_err(|e| malformed(e.to_string(), None))?
            }
            LockFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| malformed(e.to_string(), None))?
            }
            LockFormat::Toml => {
                toml::from_str(content).map_err(|e| malformed(e.to_string(), None))?
            }
        };

        let repos = match document.get("repos") {
            Some(Value::Object(repos)) => repos,
            Some(_) => {
                return Err(malformed(
                    "`repos` must be a mapping of dependency name to entry".to_string(),
                    None,
                ))
            }
            None => {
                return Err(malformed(
                    "missing top-level `repos` mapping".to_string(),
                    Some(
                        "Wrap your entries as {\"repos\": {\"<name>\": {\"url\", \"rev\", \"path\"}}}",
                    ),
                ))
            }
        };

        let mut dependencies = Vec::with_capacity(repos.len());
        for (name, entry) in repos {
            let mut spec: DependencySpec = serde_json::from_value(entry.clone()).map_err(|e| {
                malformed(
                    format!("repos.{}: {}", name, e),
                    Some("Every entry needs `url`, `rev` and `path`"),
                )
            })?;
            spec.name = name.clone();
            validate_entry(&spec)
                .map_err(|message| malformed(format!("repos.{}: {}", name, message), None))?;
            dependencies.push(spec);
        }

        warn_overlapping_paths(&dependencies);

        Ok(Self { dependencies })
    }

    /// All dependencies in document order.
    pub fn dependencies(&self) -> &[DependencySpec] {
        &self.dependencies
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Look up a dependency by name.
    pub fn get(&self, name: &str) -> Result<&DependencySpec> {
        self.dependencies
            .iter()
            .find(|dep| dep.name == name)
            .ok_or_else(|| Error::DependencyNotFound {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    /// Restrict to the named dependencies, keeping document order.
    ///
    /// An empty selection means "all dependencies". Unknown names are an
    /// error so a typo never silently turns into a no-op.
    pub fn select(&self, names: &[String]) -> Result<Vec<&DependencySpec>> {
        if names.is_empty() {
            return Ok(self.dependencies.iter().collect());
        }
        for name in names {
            self.get(name)?;
        }
        Ok(self
            .dependencies
            .iter()
            .filter(|dep| names.iter().any(|n| n == &dep.name))
            .collect())
    }

    pub fn names(&self) -> Vec<&str> {
        self.dependencies.iter().map(|d| d.name.as_str()).collect()
    }
}

fn validate_entry(spec: &DependencySpec) -> std::result::Result<(), String> {
    if spec.name.is_empty()
        || spec.name == "."
        || spec.name == ".."
        || spec.name.contains(['/', '\\'])
    {
        return Err("dependency name must be a single path segment".to_string());
    }
    if spec.url.trim().is_empty() {
        return Err("`url` is empty".to_string());
    }
    if spec.rev.trim().is_empty() {
        return Err("`rev` is empty".to_string());
    }
    if spec.path.trim().is_empty() {
        return Err("`path` is empty".to_string());
    }
    let path = Path::new(&spec.path);
    if path.is_absolute() || path.has_root() {
        return Err(format!(
            "`path` must be relative to the checkout root, got {}",
            spec.path
        ));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(format!("`path` must not leave the checkout root, got {}", spec.path));
    }
    if !path.components().any(|c| matches!(c, Component::Normal(_))) {
        return Err(format!(
            "`path` must name a directory below the checkout root, got {}",
            spec.path
        ));
    }
    Ok(())
}

/// Overlapping checkouts are not rejected, but they make `clean -fdx` in the
/// outer checkout wipe the inner one.
fn warn_overlapping_paths(dependencies: &[DependencySpec]) {
    for (i, outer) in dependencies.iter().enumerate() {
        for inner in &dependencies[i + 1..] {
            let (a, b) = (Path::new(&outer.path), Path::new(&inner.path));
            if a.starts_with(b) || b.starts_with(a) {
                warn!(
                    "Checkout paths of '{}' ({}) and '{}' ({}) overlap",
                    outer.name, outer.path, inner.name, inner.path
                );
            }
        }
    }
}
