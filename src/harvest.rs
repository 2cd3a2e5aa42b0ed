//! # Patch Harvester
//!
//! Captures the current modifications of a checkout as a fresh [`PatchSet`]
//! and replaces the dependency's patch directory with it.
//!
//! Harvesting is a pure rebuild: every change relative to the base revision
//! (modified, added and deleted files, binary content included) is staged,
//! listed and diffed one path at a time, and the previous patch directory is
//! discarded. Renames are recorded as a deletion plus an addition. The index
//! is emptied again before returning, also when harvesting fails.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::git::GitOperations;
use crate::lock::DependencySpec;
use crate::path::encode_patch_name;
use crate::report::RunOutcome;
use crate::store::{PatchFile, PatchSet, PatchStore};
use crate::sync::short_id;

/// Base revision used when none is given.
pub const DEFAULT_BASE: &str = "HEAD";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Revision the diffs are taken against; `HEAD` when unset.
    pub base: Option<String>,
    /// Derive the patch set without writing it.
    pub dry_run: bool,
}

impl HarvestOptions {
    pub fn base(&self) -> &str {
        self.base.as_deref().unwrap_or(DEFAULT_BASE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Nothing differs from the base; the store was left alone.
    Unchanged,
    /// The operator declined to replace the existing patches.
    Declined,
    Harvested {
        set: PatchSet,
        /// Number of patches the store held before.
        previous: usize,
        /// False for dry runs.
        written: bool,
    },
}

impl RunOutcome for HarvestOutcome {
    fn summary(&self) -> String {
        match self {
            HarvestOutcome::Unchanged => "no changes to harvest".to_string(),
            HarvestOutcome::Declined => "kept existing patches".to_string(),
            HarvestOutcome::Harvested {
                set,
                previous,
                written: true,
            } => format!("wrote {} patches (replaced {})", set.len(), previous),
            HarvestOutcome::Harvested { set, .. } => {
                format!("would write {} patches", set.len())
            }
        }
    }
}

/// Name each `(path, diff)` pair and sort the result into a [`PatchSet`].
///
/// Fails when two paths encode to the same patch name. Empty diffs are
/// dropped.
pub fn build_patch_set(dependency: &str, diffs: Vec<(String, Vec<u8>)>) -> Result<PatchSet> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut patches = Vec::with_capacity(diffs.len());

    for (path, diff) in diffs {
        if diff.is_empty() {
            debug!("[{}] {} has an empty diff, skipping", dependency, path);
            continue;
        }
        let name = encode_patch_name(&path);
        if let Some(first) = seen.get(&name) {
            return Err(Error::PatchNameCollision {
                dependency: dependency.to_string(),
                name,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(name.clone(), path);
        patches.push(PatchFile::new(name, diff));
    }

    Ok(PatchSet::new(patches))
}

/// Derive the patch set of the checkout's current modifications.
///
/// Returns `None` when nothing differs from `base`. The index is empty
/// afterwards whatever the result.
pub fn derive_patch_set(
    git: &dyn GitOperations,
    dependency: &str,
    checkout: &Path,
    base: &str,
) -> Result<Option<PatchSet>> {
    let derived = collect_staged(git, dependency, checkout, base);
    let unstaged = git.unstage_all(checkout);
    let derived = derived?;
    unstaged?;
    Ok(derived)
}

fn collect_staged(
    git: &dyn GitOperations,
    dependency: &str,
    checkout: &Path,
    base: &str,
) -> Result<Option<PatchSet>> {
    git.stage_all(checkout)?;
    let paths = git.staged_paths(checkout, base)?;
    if paths.is_empty() {
        return Ok(None);
    }

    info!("[{}] {} changed paths against {}", dependency, paths.len(), base);
    let diffs = paths
        .into_iter()
        .map(|path| {
            let diff = git.staged_diff(checkout, base, &path)?;
            Ok((path, diff))
        })
        .collect::<Result<Vec<_>>>()?;

    let set = build_patch_set(dependency, diffs)?;
    Ok(if set.is_empty() { None } else { Some(set) })
}

/// Harvest the modifications of `dep`'s checkout into `store`.
///
/// `confirm` is asked before existing patches are replaced and receives the
/// current and the freshly derived set. It is not consulted for dry runs or
/// when the store holds no patches.
pub fn harvest<F>(
    git: &dyn GitOperations,
    store: &PatchStore,
    dep: &DependencySpec,
    checkout: &Path,
    options: &HarvestOptions,
    confirm: F,
) -> Result<HarvestOutcome>
where
    F: FnOnce(&PatchSet, &PatchSet) -> bool,
{
    let name = dep.name.as_str();
    warn_on_drift(git, dep, checkout);

    let base = options.base();
    let Some(set) = derive_patch_set(git, name, checkout, base)? else {
        info!("[{}] no changes against {}", name, base);
        return Ok(HarvestOutcome::Unchanged);
    };

    let existing = store.load(name)?;
    if options.dry_run {
        return Ok(HarvestOutcome::Harvested {
            set,
            previous: existing.len(),
            written: false,
        });
    }

    if !existing.is_empty() && !confirm(&existing, &set) {
        info!("[{}] keeping {} existing patches", name, existing.len());
        return Ok(HarvestOutcome::Declined);
    }

    store.replace(name, &set)?;
    info!(
        "[{}] wrote {} patches to {}",
        name,
        set.len(),
        store.dir_for(name).display()
    );
    Ok(HarvestOutcome::Harvested {
        set,
        previous: existing.len(),
        written: true,
    })
}

/// Harvesting a checkout moved away from its pin mixes upstream changes
/// into the patches.
fn warn_on_drift(git: &dyn GitOperations, dep: &DependencySpec, checkout: &Path) {
    if let (Ok(head), Ok(pinned)) = (git.head(checkout), git.resolve(checkout, &dep.rev)) {
        if head != pinned {
            warn!(
                "[{}] HEAD {} differs from pinned revision {}",
                dep.name,
                short_id(&head),
                short_id(&pinned)
            );
        }
    }
}
