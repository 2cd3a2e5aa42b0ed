//! # Error Handling
//!
//! This module defines the centralized error type for `vendor-patch`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! anticipated failure mode of the patch-overlay engine, with contextual
//! fields that make the rendered message actionable on its own.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`LockNotFound`, `LockMalformed`,
//!   `DependencyNotFound`): raised before any checkout is touched.
//! - **Checkout errors** (`CheckoutCorrupted`, `CheckoutMissing`,
//!   `CheckoutLocked`, `CheckoutContainsRoot`): the on-disk working copy is
//!   not in a usable state, or would swallow the patch-management root.
//! - **Synchronization errors** (`SyncFailure`): clone, fetch or checkout of
//!   a pinned revision failed for one dependency.
//! - **Patch errors** (`Conflict`, `PatchNameCollision`, `PatchStore`): a
//!   patch could neither be applied nor reversed, or the patch directory
//!   could not be read or rebuilt.
//! - **Wrapped errors** (`Io`, `Json`, `Yaml`, `Toml`).
//!
//! `AlreadyApplied` is deliberately absent: a patch whose change is already
//! present is an outcome, not an error (see `apply::ApplyOutcome`).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for vendor-patch operations
#[derive(Error, Debug)]
pub enum Error {
    /// The lock document does not exist.
    #[error("Lock file not found: {}", path.display())]
    LockNotFound { path: PathBuf },

    /// The lock document exists but could not be understood.
    ///
    /// Includes the offending location and an optional hint about how to fix
    /// it.
    #[error("Malformed lock file {}: {message}{}", path.display(), hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    LockMalformed {
        path: PathBuf,
        message: String,
        /// Optional hint for how to fix the lock document
        hint: Option<String>,
    },

    /// A dependency name was requested that the lock document does not define.
    #[error("Unknown dependency '{name}' (known: {known})")]
    DependencyNotFound { name: String, known: String },

    /// The checkout path exists but is not a git repository.
    ///
    /// Recoverable: the synchronizer deletes and re-clones the directory.
    #[error("[{dependency}] checkout at {} is not a valid repository", path.display())]
    CheckoutCorrupted { dependency: String, path: PathBuf },

    /// The checkout path does not exist or is not a repository when an
    /// operation other than `sync` needs it.
    #[error("[{dependency}] checkout at {} is missing; run `vendor-patch sync` first", path.display())]
    CheckoutMissing { dependency: String, path: PathBuf },

    /// The checkout path is, or contains, the patch-management root.
    ///
    /// Syncing it would reset or delete the lock file and the patches.
    #[error("[{dependency}] checkout at {} contains the patch root {}", path.display(), root.display())]
    CheckoutContainsRoot {
        dependency: String,
        path: PathBuf,
        root: PathBuf,
    },

    /// Another invocation holds the advisory lock for this checkout.
    #[error("[{dependency}] checkout is locked by another invocation ({})", lock.display())]
    CheckoutLocked { dependency: String, lock: PathBuf },

    /// Clone, fetch, checkout or reset failed while synchronizing.
    #[error("[{dependency}] sync failed during {step}: {message}")]
    SyncFailure {
        dependency: String,
        step: String,
        message: String,
    },

    /// A git subprocess exited unsuccessfully.
    #[error("Git command failed in {}: git {command} - {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// A patch can neither be applied nor reversed against the current tree.
    #[error("[{dependency}] patch {patch} conflicts: {message}")]
    Conflict {
        dependency: String,
        patch: String,
        message: String,
    },

    /// Two changed paths encode to the same patch file name.
    #[error("[{dependency}] paths '{first}' and '{second}' both encode to patch name '{name}'")]
    PatchNameCollision {
        dependency: String,
        name: String,
        first: String,
        second: String,
    },

    /// The patch directory could not be read or rebuilt.
    #[error("Patch store error at {}: {message}", path.display())]
    PatchStore { path: PathBuf, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error invalidates the whole run rather than a single
    /// dependency.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::LockNotFound { .. }
                | Error::LockMalformed { .. }
                | Error::DependencyNotFound { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
