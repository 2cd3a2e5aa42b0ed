//! Advisory per-dependency locks.
//!
//! Two invocations working on the same checkout at once would interleave
//! resets, applies and index manipulation. Each operation therefore holds
//! `.locks/<dependency>.lock`, created exclusively and removed on drop. A
//! lock left behind by a killed process has to be removed by hand; its
//! content names the owning pid.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct CheckoutLock {
    path: PathBuf,
}

impl CheckoutLock {
    pub fn acquire(locks_dir: &Path, dependency: &str) -> Result<Self> {
        fs::create_dir_all(locks_dir)?;
        let path = locks_dir.join(format!("{}.lock", dependency));

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::CheckoutLocked {
                    dependency: dependency.to_string(),
                    lock: path,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let lock = Self { path };
        writeln!(
            file,
            "pid={} since={}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        )?;
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CheckoutLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
