//! # Checkout Synchronizer
//!
//! Brings one dependency's checkout to its pinned revision with a pristine
//! tree:
//!
//! 1. Clone when the checkout path does not exist.
//! 2. When the path exists but is not a repository, delete it and clone
//!    again. A valid repository is never deleted, whatever its remote.
//! 3. Fetch from `origin`.
//! 4. Check out the pinned revision as a detached HEAD.
//! 5. Hard reset and remove untracked and ignored files.
//!
//! A failing step is reported as `SyncFailure` naming the step, and the
//! checkout is never silently left at a stale revision: HEAD is verified
//! against the pinned revision at the end.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::git::{failure_hint, redact_url, GitOperations};
use crate::lock::DependencySpec;
use crate::report::RunOutcome;

/// How the checkout came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    /// The directory was not a repository and was recreated.
    Recovered,
    Updated,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Cloned => write!(f, "cloned"),
            SyncAction::Recovered => write!(f, "recovered"),
            SyncAction::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub action: SyncAction,
    /// Commit id HEAD points to after the sync.
    pub head: String,
}

impl RunOutcome for SyncOutcome {
    fn summary(&self) -> String {
        format!("{} at {}", self.action, short_id(&self.head))
    }
}

/// First 12 characters of a commit id.
pub fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Synchronize `dep` into `checkout`.
pub fn sync_checkout(
    git: &dyn GitOperations,
    dep: &DependencySpec,
    checkout: &Path,
) -> Result<SyncOutcome> {
    let name = dep.name.as_str();
    info!("[{}] syncing to {}", name, checkout.display());

    let action = if !checkout.exists() {
        info!("[{}] cloning {}", name, redact_url(&dep.url));
        step(name, "clone", git.clone_repo(&dep.url, checkout))?;
        SyncAction::Cloned
    } else if !git.is_repository(checkout) {
        warn!(
            "{}; removing it and cloning again",
            Error::CheckoutCorrupted {
                dependency: name.to_string(),
                path: checkout.to_path_buf(),
            }
        );
        step(name, "recover", remove_path(checkout))?;
        step(name, "clone", git.clone_repo(&dep.url, checkout))?;
        SyncAction::Recovered
    } else {
        SyncAction::Updated
    };

    info!("[{}] fetching origin", name);
    step(name, "fetch", git.fetch(checkout))?;

    info!("[{}] checking out {}", name, dep.rev);
    step(name, "checkout", git.checkout_detached(checkout, &dep.rev))?;

    info!("[{}] cleaning working tree", name);
    step(name, "reset", git.reset_hard(checkout))?;
    step(name, "clean", git.clean(checkout, true))?;

    let head = step(name, "verify", git.head(checkout))?;
    let pinned = step(name, "verify", git.resolve(checkout, &dep.rev))?;
    if head != pinned {
        return Err(Error::SyncFailure {
            dependency: name.to_string(),
            step: "verify".to_string(),
            message: format!("HEAD is {} but {} resolves to {}", head, dep.rev, pinned),
        });
    }

    Ok(SyncOutcome { action, head })
}

fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Attach the dependency and step to a failure.
fn step<T>(dependency: &str, step: &str, result: Result<T>) -> Result<T> {
    result.map_err(|e| {
        let detail = match e {
            Error::GitCommand { stderr, .. } => stderr,
            other => other.to_string(),
        };
        let message = match failure_hint(&detail) {
            Some(hint) => format!("{}\n  hint: {}", detail, hint),
            None => detail,
        };
        Error::SyncFailure {
            dependency: dependency.to_string(),
            step: step.to_string(),
            message,
        }
    })
}
