//! # Patch Applicator
//!
//! Applies a dependency's [`PatchSet`] on top of its pristine checkout.
//!
//! Each patch is classified from two dry-run predicates evaluated against
//! the current tree:
//!
//! | `can_apply` | `can_reverse` | Result                                   |
//! |-------------|---------------|------------------------------------------|
//! | yes         | -             | apply exactly, `Applied`                 |
//! | no          | yes           | change already present, `AlreadyApplied` |
//! | no          | no            | three-way fallback, `Applied` or `Conflict` |
//!
//! The reverse check runs before the three-way fallback: a three-way merge of
//! a change that is already present succeeds as a no-op and would otherwise
//! be reported as `Applied`.
//!
//! A `Conflict` stops the remaining patches of that dependency and leaves the
//! partially patched tree in place for inspection. Whatever happens, the
//! index is emptied at the end so patched files only ever appear as
//! working-tree modifications.

use std::fmt;
use std::path::Path;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::git::{ApplyMode, GitOperations};
use crate::record::{ApplyRecord, RecordStore};
use crate::report::RunOutcome;
use crate::store::{PatchFile, PatchSet};

/// Per-patch result of an apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied,
    AlreadyApplied,
    Conflict,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOutcome::Applied => write!(f, "applied"),
            ApplyOutcome::AlreadyApplied => write!(f, "already applied"),
            ApplyOutcome::Conflict => write!(f, "conflict"),
        }
    }
}

/// What the dry-run predicates say about a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The patch applies with exact context.
    ApplyExact,
    /// Reversing the patch would succeed, so its change is already present.
    AlreadyPresent,
    /// Neither direction matches; only a three-way merge can help.
    ThreeWay,
}

/// Classify a patch from `can_apply` and `can_reverse`.
pub fn plan(can_apply: bool, can_reverse: bool) -> Plan {
    match (can_apply, can_reverse) {
        (true, _) => Plan::ApplyExact,
        (false, true) => Plan::AlreadyPresent,
        (false, false) => Plan::ThreeWay,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub patch: String,
    pub outcome: ApplyOutcome,
    /// Extra context: the git error for conflicts, the merge strategy for
    /// three-way applications.
    pub detail: Option<String>,
}

/// Result of applying one dependency's patch set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyRun {
    pub patches: Vec<PatchReport>,
}

impl ApplyRun {
    pub fn count(&self, outcome: ApplyOutcome) -> usize {
        self.patches.iter().filter(|p| p.outcome == outcome).count()
    }

    /// The patch that stopped the run, if any.
    pub fn conflict(&self) -> Option<&PatchReport> {
        self.patches
            .iter()
            .find(|p| p.outcome == ApplyOutcome::Conflict)
    }
}

impl RunOutcome for ApplyRun {
    fn succeeded(&self) -> bool {
        self.conflict().is_none()
    }

    fn summary(&self) -> String {
        if self.patches.is_empty() {
            return "no patches".to_string();
        }
        match self.conflict() {
            Some(report) => format!(
                "conflict in {}: {}",
                report.patch,
                report.detail.as_deref().unwrap_or("patch does not apply")
            ),
            None => format!(
                "{} applied, {} already applied",
                self.count(ApplyOutcome::Applied),
                self.count(ApplyOutcome::AlreadyApplied)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Reset to the pristine baseline before applying.
    pub reset: bool,
    /// Write an audit record for each patch present after the run.
    pub record: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            reset: true,
            record: false,
        }
    }
}

/// Apply `set` to the checkout at `checkout`.
///
/// An empty set returns immediately without touching the checkout.
pub fn apply_patch_set(
    git: &dyn GitOperations,
    dependency: &str,
    checkout: &Path,
    set: &PatchSet,
    options: &ApplyOptions,
    records: Option<&RecordStore>,
) -> Result<ApplyRun> {
    if set.is_empty() {
        info!("[{}] no patches", dependency);
        return Ok(ApplyRun::default());
    }

    if options.reset {
        info!("[{}] resetting {} to clean state", dependency, checkout.display());
        git.reset_hard(checkout)?;
        git.clean(checkout, false)?;
        if let Some(records) = records {
            records.clear(dependency)?;
        }
    }

    info!("[{}] applying {} patches", dependency, set.len());
    let run = apply_in_order(git, dependency, checkout, set);

    // Patched files must stay untracked working-tree changes, even after a
    // failed three-way merge left entries in the index.
    let unstaged = git.unstage_all(checkout);
    let run = run?;
    unstaged?;

    if let Some(records) = records.filter(|_| options.record) {
        for report in run.patches.iter().filter(|p| p.outcome != ApplyOutcome::Conflict) {
            if let Some(patch) = set.get(&report.patch) {
                records.write(dependency, &ApplyRecord::new(patch, report.outcome))?;
            }
        }
    }

    Ok(run)
}

fn apply_in_order(
    git: &dyn GitOperations,
    dependency: &str,
    checkout: &Path,
    set: &PatchSet,
) -> Result<ApplyRun> {
    let mut run = ApplyRun::default();
    for patch in set {
        let report = apply_one(git, dependency, checkout, patch)?;
        let stop = report.outcome == ApplyOutcome::Conflict;
        run.patches.push(report);
        if stop {
            break;
        }
    }
    Ok(run)
}

fn apply_one(
    git: &dyn GitOperations,
    dependency: &str,
    checkout: &Path,
    patch: &PatchFile,
) -> Result<PatchReport> {
    let can_apply = git.check_patch(checkout, &patch.content, false).is_ok();
    let can_reverse = !can_apply && git.check_patch(checkout, &patch.content, true).is_ok();

    let report = |outcome, detail: Option<String>| PatchReport {
        patch: patch.name.clone(),
        outcome,
        detail,
    };

    match plan(can_apply, can_reverse) {
        Plan::ApplyExact => {
            git.apply_patch(checkout, &patch.content, ApplyMode::Exact)?;
            info!("[{}] applied {}", dependency, patch.name);
            Ok(report(ApplyOutcome::Applied, None))
        }
        Plan::AlreadyPresent => {
            info!("[{}] skipped {} (already applied)", dependency, patch.name);
            Ok(report(ApplyOutcome::AlreadyApplied, None))
        }
        Plan::ThreeWay => match git.apply_patch(checkout, &patch.content, ApplyMode::ThreeWay) {
            Ok(()) => {
                info!("[{}] applied {} with three-way merge", dependency, patch.name);
                Ok(report(ApplyOutcome::Applied, Some("three-way merge".to_string())))
            }
            Err(e) => {
                let message = match e {
                    Error::GitCommand { stderr, .. } => stderr,
                    other => other.to_string(),
                };
                error!(
                    "{}",
                    Error::Conflict {
                        dependency: dependency.to_string(),
                        patch: patch.name.clone(),
                        message: message.clone(),
                    }
                );
                Ok(report(ApplyOutcome::Conflict, Some(message)))
            }
        },
    }
}
