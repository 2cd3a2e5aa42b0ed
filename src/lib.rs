//! # Vendor Patch Library
//!
//! This library vendors external git repositories into a host project at
//! pinned revisions and keeps a maintained set of local diffs on top of each
//! pristine checkout, so local changes survive moving to a newer upstream
//! revision. It is designed to be used by the `vendor-patch` command-line
//! tool but can be embedded wherever the same workflow is needed.
//!
//! ## Quick Example
//!
//! ```
//! use vendor_patch::lock::{LockFile, LockFormat};
//! use vendor_patch::path::encode_patch_name;
//! use std::path::Path;
//!
//! let lock = LockFile::parse(
//!     r#"{"repos": {"client": {"url": "https://example.com/client.git", "rev": "v1.2.0", "path": "src/client"}}}"#,
//!     LockFormat::Json,
//!     Path::new("deps.lock.json"),
//! )
//! .unwrap();
//! assert_eq!(lock.get("client").unwrap().rev, "v1.2.0");
//!
//! assert_eq!(encode_patch_name("net/socket.c"), "net_socket.c.diff");
//! ```
//!
//! ## Core Concepts
//!
//! - **Lock Model (`lock`)**: The read-only document mapping each dependency
//!   name to a clone URL, a pinned revision and a checkout path.
//! - **Checkout Synchronizer (`sync`)**: Brings a checkout to its pinned
//!   revision with a pristine tree, recovering directories that are not
//!   repositories.
//! - **Patch Store (`store`)**: The on-disk patch directories and the sorted
//!   `PatchSet` they hold.
//! - **Patch Applicator (`apply`)**: Applies a `PatchSet` with already-applied
//!   detection and a three-way fallback.
//! - **Patch Harvester (`harvest`)**: Re-derives the `PatchSet` of a checkout
//!   from its working-tree modifications.
//! - **Orchestration (`manager`)**: Runs the engine over the dependencies of a
//!   lock document, one failure domain per dependency.
//!
//! ## Execution Flow
//!
//! 1.  **Sync**: every dependency is cloned or fetched and detached at its
//!     pinned revision.
//! 2.  **Apply**: the stored patches are layered on top of each checkout.
//! 3.  **Edit**: a maintainer changes files inside a checkout.
//! 4.  **Harvest**: the changes are captured back into that dependency's
//!     patch directory, replacing the previous patches.

pub mod apply;
pub mod checkout_lock;
pub mod error;
pub mod git;
pub mod harvest;
pub mod layout;
pub mod lock;
pub mod manager;
pub mod output;
pub mod path;
pub mod record;
pub mod report;
pub mod store;
pub mod sync;

#[cfg(test)]
mod path_proptest;
