//! Apply records.
//!
//! When enabled, every patch that ends up present in a checkout after an
//! apply run gets a small JSON record under
//! `patchinfo/<dependency>/<patch>.info.json` holding the patch's sha256 and
//! the time it was applied. Records are written for auditing only; apply
//! never reads them to decide what to do.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::apply::ApplyOutcome;
use crate::error::Result;
use crate::store::PatchFile;

const RECORD_SUFFIX: &str = ".info.json";

/// Audit record for one patch in one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRecord {
    pub patch: String,
    pub sha256: String,
    pub outcome: ApplyOutcome,
    pub applied_at: DateTime<Utc>,
}

impl ApplyRecord {
    pub fn new(patch: &PatchFile, outcome: ApplyOutcome) -> Self {
        Self {
            patch: patch.name.clone(),
            sha256: sha256_hex(&patch.content),
            outcome,
            applied_at: Utc::now(),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Record directories rooted at `patchinfo/`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dir_for(&self, dependency: &str) -> PathBuf {
        self.root.join(dependency)
    }

    fn record_path(&self, dependency: &str, patch: &str) -> PathBuf {
        self.dir_for(dependency)
            .join(format!("{}{}", patch, RECORD_SUFFIX))
    }

    /// Forget every record of `dependency`, e.g. after its checkout was reset.
    pub fn clear(&self, dependency: &str) -> Result<()> {
        let dir = self.dir_for(dependency);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn write(&self, dependency: &str, record: &ApplyRecord) -> Result<()> {
        let path = self.record_path(dependency, &record.patch);
        ensure_parent(&path)?;
        fs::write(&path, serde_json::to_vec_pretty(record)?)?;
        Ok(())
    }

    pub fn read(&self, dependency: &str, patch: &str) -> Result<Option<ApplyRecord>> {
        let path = self.record_path(dependency, patch);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&fs::read(&path)?)?))
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
