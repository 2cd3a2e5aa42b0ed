//! # Patch Store
//!
//! Patches for a dependency live in `patches/<dependency>/`, one file per
//! changed path. The order in which they are applied is the byte-wise,
//! case-sensitive order of their file names, which is the only way one patch
//! can depend on another: a patch that needs a previous hunk must be named to
//! sort after it.
//!
//! A missing patch directory is not an error; it simply means the
//! dependency carries no local modifications.
//!
//! Rewriting a directory goes through a sibling staging directory so a
//! failure while writing never leaves a mix of old and new patches behind.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::path::is_patch_file_name;

/// One diff file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    /// File name inside the dependency's patch directory.
    pub name: String,
    /// Unified diff, possibly with binary hunks.
    pub content: Vec<u8>,
}

impl PatchFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// The ordered patches of one dependency.
///
/// Always sorted by name; construction sorts, so no caller can observe a
/// different order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    patches: Vec<PatchFile>,
}

impl PatchSet {
    pub fn new(mut patches: Vec<PatchFile>) -> Self {
        patches.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self { patches }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchFile> {
        self.patches.iter()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.patches.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PatchFile> {
        self.patches.iter().find(|p| p.name == name)
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a PatchFile;
    type IntoIter = std::slice::Iter<'a, PatchFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}

/// On-disk patch directories rooted at `patches/`.
#[derive(Debug, Clone)]
pub struct PatchStore {
    root: PathBuf,
}

impl PatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the patches of `dependency`.
    pub fn dir_for(&self, dependency: &str) -> PathBuf {
        self.root.join(dependency)
    }

    /// Load the patch set of `dependency`; absent directory means empty.
    pub fn load(&self, dependency: &str) -> Result<PatchSet> {
        let dir = self.dir_for(dependency);
        if !dir.is_dir() {
            debug!("[{}] no patch directory at {}", dependency, dir.display());
            return Ok(PatchSet::default());
        }

        let mut patches = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| store_error(&dir, e))? {
            let entry = entry.map_err(|e| store_error(&dir, e))?;
            let path = entry.path();
            if !entry.file_type().map_err(|e| store_error(&path, e))?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(
                    "[{}] skipping patch with non UTF-8 name: {}",
                    dependency,
                    path.display()
                );
                continue;
            };
            if !is_patch_file_name(&name) {
                continue;
            }
            let content = fs::read(&path).map_err(|e| store_error(&path, e))?;
            patches.push(PatchFile { name, content });
        }

        Ok(PatchSet::new(patches))
    }

    /// Replace the patch directory of `dependency` with exactly `set`.
    ///
    /// An empty set removes the directory.
    pub fn replace(&self, dependency: &str, set: &PatchSet) -> Result<()> {
        let dir = self.dir_for(dependency);
        let staging = self.root.join(format!(".{}.staging", dependency));

        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| store_error(&staging, e))?;
        }

        if !set.is_empty() {
            fs::create_dir_all(&staging).map_err(|e| store_error(&staging, e))?;
            for patch in set {
                let path = staging.join(&patch.name);
                if let Err(e) = fs::write(&path, &patch.content) {
                    let _ = fs::remove_dir_all(&staging);
                    return Err(store_error(&path, e));
                }
            }
        }

        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| store_error(&dir, e))?;
        }
        if !set.is_empty() {
            fs::rename(&staging, &dir).map_err(|e| store_error(&dir, e))?;
        }
        Ok(())
    }
}

fn store_error(path: &Path, e: std::io::Error) -> Error {
    Error::PatchStore {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
