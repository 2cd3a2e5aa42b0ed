//! Path and patch-name utilities for vendor-patch

use crate::error::{Error, Result};
use glob::Pattern;

/// Extension given to harvested patch files.
pub const PATCH_EXTENSION: &str = "diff";

/// File name patterns recognized as patches inside a patch directory.
pub const PATCH_FILE_PATTERNS: &[&str] = &["*.diff", "*.patch"];

/// Match a path against a glob pattern
pub fn glob_match(pattern: &str, path: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(|e| Error::PatchStore {
        path: pattern.into(),
        message: e.to_string(),
    })?;
    Ok(pattern.matches(path))
}

/// Whether a directory entry name is a patch file.
///
/// Leading dots are allowed: changes to dotfiles such as `.gitignore`
/// encode to `.gitignore.diff`.
pub fn is_patch_file_name(name: &str) -> bool {
    PATCH_FILE_PATTERNS
        .iter()
        .any(|pattern| glob_match(pattern, name).unwrap_or(false))
}

/// Encode a repo-relative path as a flat patch file name.
///
/// Every path separator becomes `_` and the patch extension is appended, so
/// `src/net/socket.c` becomes `src_net_socket.c.diff`. The encoding is not
/// injective (`a/b` and `a_b` collide); callers that write patch sets must
/// detect collisions.
pub fn encode_patch_name(repo_path: &str) -> String {
    let mut name: String = repo_path
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect();
    name.push('.');
    name.push_str(PATCH_EXTENSION);
    name
}
