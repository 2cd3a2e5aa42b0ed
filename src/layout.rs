//! # Directory Layout
//!
//! A patch-management root is a directory inside the host project:
//!
//! ```text
//! my-product/                 <- checkout root (parent of the root by default)
//! ├── src/client/             <- a vendored checkout (path from the lock file)
//! └── patch_system/           <- patch-management root
//!     ├── deps.lock.json
//!     ├── patches/<name>/*.diff
//!     ├── patchinfo/<name>/   <- optional apply records
//!     └── .locks/<name>.lock  <- advisory checkout locks
//! ```
//!
//! Every location can be overridden; the CLI exposes the overrides as flags
//! with environment-variable fallbacks.

use std::path::{Component, Path, PathBuf};

use crate::lock::DEFAULT_LOCK_FILENAME;

/// Name of the patch directory inside the root.
pub const PATCHES_DIR: &str = "patches";

/// Name of the apply-record directory inside the root.
pub const RECORDS_DIR: &str = "patchinfo";

/// Name of the advisory lock directory inside the root.
pub const LOCKS_DIR: &str = ".locks";

/// Resolved locations for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub lock_file: PathBuf,
    pub checkout_root: PathBuf,
}

impl Layout {
    /// Layout with every location derived from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let lock_file = root.join(DEFAULT_LOCK_FILENAME);
        let checkout_root = default_checkout_root(&root);
        Self {
            root,
            lock_file,
            checkout_root,
        }
    }

    /// Layout honoring explicit overrides; `None` falls back to the defaults.
    pub fn resolve(
        root: PathBuf,
        lock_file: Option<PathBuf>,
        checkout_root: Option<PathBuf>,
    ) -> Self {
        let mut layout = Self::new(root);
        if let Some(lock_file) = lock_file {
            layout.lock_file = lock_file;
        }
        if let Some(checkout_root) = checkout_root {
            layout.checkout_root = checkout_root;
        }
        layout
    }

    pub fn patches_dir(&self) -> PathBuf {
        self.root.join(PATCHES_DIR)
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(LOCKS_DIR)
    }

    /// Whether `dir` is the root or one of its ancestors.
    ///
    /// Paths are normalized lexically, then resolved through symlinks when
    /// they exist.
    pub fn root_is_within(&self, dir: &Path) -> bool {
        normalize(&self.root).starts_with(normalize(dir))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized.canonicalize().unwrap_or(normalized)
}

/// The parent of the root, or the root itself when it has no parent.
fn default_checkout_root(root: &Path) -> PathBuf {
    // "." has an empty parent; its checkouts live one level up
    if root.components().all(|c| c == Component::CurDir) {
        return PathBuf::from("..");
    }
    match root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        // A relative single-segment root like "patch_system"
        Some(_) => PathBuf::from("."),
        None => root.to_path_buf(),
    }
}
