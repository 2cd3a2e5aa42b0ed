//! # Dependency Orchestration
//!
//! `PatchManager` ties the lock document, the directory layout and the git
//! collaborator together and runs the engine over a selection of
//! dependencies.
//!
//! Every dependency is processed in its own failure domain: its checkout lock
//! is held for the duration of its work, and its result lands in a
//! [`BatchReport`] entry whatever happens to the others. Configuration errors
//! (unknown dependency names) are returned before any checkout is touched.
//!
//! Git access goes through [`GitOperations`] so tests can substitute a mock.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use rayon::prelude::*;

use crate::apply::{apply_patch_set, ApplyOptions, ApplyRun};
use crate::checkout_lock::CheckoutLock;
use crate::error::{Error, Result};
use crate::git::{GitOperations, SystemGit};
use crate::harvest::{harvest, HarvestOptions, HarvestOutcome};
use crate::layout::Layout;
use crate::lock::{DependencySpec, LockFile};
use crate::record::RecordStore;
use crate::report::{BatchReport, RunOutcome};
use crate::store::{PatchSet, PatchStore};
use crate::sync::{sync_checkout, SyncOutcome};

/// How a batch walks over its dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Continue with the remaining dependencies after a failure.
    pub keep_going: bool,
    /// One rayon task per dependency. Every dependency is attempted.
    pub parallel: bool,
}

/// State of a checkout on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Missing,
    NotRepository,
    Ready {
        head: String,
        /// Whether HEAD is the pinned revision; `None` when the pin does
        /// not resolve locally.
        pinned: Option<bool>,
        /// Working-tree modifications (applied patches show up here).
        dirty: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub name: String,
    pub rev: String,
    pub checkout: PathBuf,
    pub state: CheckoutState,
    pub patches: Vec<String>,
}

pub struct PatchManager {
    git: Box<dyn GitOperations>,
    layout: Layout,
    lock: LockFile,
}

impl PatchManager {
    /// Load the lock document named by `layout` and use the system `git`.
    pub fn open(layout: Layout) -> Result<Self> {
        let lock = LockFile::from_file(&layout.lock_file)?;
        debug!(
            "loaded {} dependencies from {}",
            lock.len(),
            layout.lock_file.display()
        );
        Ok(Self::new(layout, lock))
    }

    pub fn new(layout: Layout, lock: LockFile) -> Self {
        Self::with_operations(Box::new(SystemGit), layout, lock)
    }

    /// Use a custom `GitOperations` implementation.
    pub fn with_operations(git: Box<dyn GitOperations>, layout: Layout, lock: LockFile) -> Self {
        Self { git, layout, lock }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn lock_file(&self) -> &LockFile {
        &self.lock
    }

    pub fn store(&self) -> PatchStore {
        PatchStore::new(self.layout.patches_dir())
    }

    pub fn records(&self) -> RecordStore {
        RecordStore::new(self.layout.records_dir())
    }

    pub fn checkout_dir(&self, dep: &DependencySpec) -> PathBuf {
        dep.checkout_dir(&self.layout.checkout_root)
    }

    /// Synchronize the selected dependencies (all when `names` is empty).
    pub fn sync_all(
        &self,
        names: &[String],
        options: BatchOptions,
    ) -> Result<BatchReport<SyncOutcome>> {
        let deps = self.lock.select(names)?;
        Ok(self.run_batch(&deps, options, |dep| {
            let checkout = self.guarded_checkout_dir(dep)?;
            let _guard = CheckoutLock::acquire(&self.layout.locks_dir(), &dep.name)?;
            sync_checkout(self.git.as_ref(), dep, &checkout)
        }))
    }

    /// Apply the stored patches of the selected dependencies.
    ///
    /// A conflict in one dependency never stops the others.
    pub fn apply_all(
        &self,
        names: &[String],
        apply: &ApplyOptions,
        options: BatchOptions,
    ) -> Result<BatchReport<ApplyRun>> {
        let deps = self.lock.select(names)?;
        let options = BatchOptions {
            keep_going: true,
            ..options
        };
        Ok(self.run_batch(&deps, options, |dep| self.apply_one(dep, apply)))
    }

    fn apply_one(&self, dep: &DependencySpec, apply: &ApplyOptions) -> Result<ApplyRun> {
        let set = self.store().load(&dep.name)?;
        if set.is_empty() {
            return Ok(ApplyRun::default());
        }

        let _guard = CheckoutLock::acquire(&self.layout.locks_dir(), &dep.name)?;
        let checkout = self.ready_checkout(dep)?;
        let records = self.records();
        apply_patch_set(
            self.git.as_ref(),
            &dep.name,
            &checkout,
            &set,
            apply,
            Some(&records),
        )
    }

    /// Harvest the modifications of one dependency's checkout.
    pub fn harvest<F>(
        &self,
        name: &str,
        options: &HarvestOptions,
        confirm: F,
    ) -> Result<HarvestOutcome>
    where
        F: FnOnce(&PatchSet, &PatchSet) -> bool,
    {
        let dep = self.lock.get(name)?;
        let _guard = CheckoutLock::acquire(&self.layout.locks_dir(), &dep.name)?;
        let checkout = self.ready_checkout(dep)?;
        harvest(self.git.as_ref(), &self.store(), dep, &checkout, options, confirm)
    }

    /// Read-only view of every dependency.
    pub fn status(&self) -> Result<Vec<DependencyStatus>> {
        let store = self.store();
        self.lock
            .dependencies()
            .iter()
            .map(|dep| {
                let checkout = self.checkout_dir(dep);
                let patches = store.load(&dep.name)?;
                Ok(DependencyStatus {
                    name: dep.name.clone(),
                    rev: dep.rev.clone(),
                    state: self.checkout_state(dep, &checkout),
                    checkout,
                    patches: patches.names().into_iter().map(str::to_string).collect(),
                })
            })
            .collect()
    }

    fn checkout_state(&self, dep: &DependencySpec, checkout: &Path) -> CheckoutState {
        if !checkout.exists() {
            return CheckoutState::Missing;
        }
        if !self.git.is_repository(checkout) {
            return CheckoutState::NotRepository;
        }
        let head = match self.git.head(checkout) {
            Ok(head) => head,
            Err(e) => {
                warn!("[{}] cannot read HEAD: {}", dep.name, e);
                return CheckoutState::NotRepository;
            }
        };
        let pinned = self.git.resolve(checkout, &dep.rev).ok().map(|rev| rev == head);
        let dirty = self.git.is_dirty(checkout).unwrap_or(false);
        CheckoutState::Ready { head, pinned, dirty }
    }

    /// The checkout path, refused when it is or contains the root: sync,
    /// apply and harvest all reset or clean it.
    fn guarded_checkout_dir(&self, dep: &DependencySpec) -> Result<PathBuf> {
        let checkout = self.checkout_dir(dep);
        if self.layout.root_is_within(&checkout) {
            return Err(Error::CheckoutContainsRoot {
                dependency: dep.name.clone(),
                path: checkout,
                root: self.layout.root.clone(),
            });
        }
        Ok(checkout)
    }

    /// The checkout path, provided it holds a repository.
    fn ready_checkout(&self, dep: &DependencySpec) -> Result<PathBuf> {
        let checkout = self.guarded_checkout_dir(dep)?;
        if !checkout.exists() || !self.git.is_repository(&checkout) {
            return Err(Error::CheckoutMissing {
                dependency: dep.name.clone(),
                path: checkout,
            });
        }
        Ok(checkout)
    }

    fn run_batch<T, F>(
        &self,
        deps: &[&DependencySpec],
        options: BatchOptions,
        work: F,
    ) -> BatchReport<T>
    where
        T: RunOutcome + Send,
        F: Fn(&DependencySpec) -> Result<T> + Sync,
    {
        let mut batch = BatchReport::default();

        if options.parallel {
            let results: Vec<(String, Result<T>)> = deps
                .par_iter()
                .map(|dep| (dep.name.clone(), work(*dep)))
                .collect();
            for (name, result) in results {
                batch.push(name, result);
            }
            return batch;
        }

        for (index, dep) in deps.iter().enumerate() {
            batch.push(dep.name.clone(), work(*dep));
            let failed = batch.reports.last().is_some_and(|r| !r.succeeded());
            if failed && !options.keep_going {
                if index + 1 < deps.len() {
                    batch.stopped_early = true;
                }
                break;
            }
        }
        batch
    }
}
