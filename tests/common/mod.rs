//! Shared test utilities for integration and E2E tests.
//!
//! Every fixture builds the same world inside a temporary directory:
//!
//! ```text
//! <tmp>/upstream/                 git repository with two commits
//! <tmp>/product/patch_system/     patch-management root (deps.lock.json, patches/)
//! <tmp>/product/src/test_repo/    checkout created by sync
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_lock_at_rev1();
//!     fixture.command().arg("sync").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use vendor_patch::layout::Layout;
use vendor_patch::manager::PatchManager;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{git, patches, TestFixture, DEP};
}

/// Name of the dependency every fixture lock file declares.
pub const DEP: &str = "test_repo";

/// Upstream `lines.txt` at the first revision.
pub const LINES_REV1: &str = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";

/// Upstream `lines.txt` at the second revision: line 6 changed.
pub const LINES_REV2: &str = "1\n2\n3\n4\n5\nsix\n7\n8\n9\n10\n";

/// Hand-written patch contents.
#[allow(dead_code)]
pub mod patches {
    /// Creates `new_file.txt`.
    pub const NEW_FILE: &str = "diff --git a/new_file.txt b/new_file.txt
new file mode 100644
index 0000000..530bccc
--- /dev/null
+++ b/new_file.txt
@@ -0,0 +1 @@
+patched content
";

    /// Creates `other_file.txt`.
    pub const OTHER_FILE: &str = "diff --git a/other_file.txt b/other_file.txt
new file mode 100644
--- /dev/null
+++ b/other_file.txt
@@ -0,0 +1 @@
+other content
";

    /// Expects `dummy.txt` content no revision has.
    pub const CONFLICTING: &str = "diff --git a/dummy.txt b/dummy.txt
--- a/dummy.txt
+++ b/dummy.txt
@@ -1 +1 @@
-something else entirely
+replacement
";
}

/// Run git in `dir`, panicking with its stderr on failure; returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository that can commit without global configuration.
pub fn init_git_repo(dir: &Path) {
    fs::create_dir_all(dir).expect("Failed to create repo dir");
    git(dir, &["init", "--quiet", "-b", "main"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Write files, commit them and return the new commit id.
pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) -> String {
    for (path, content) in files {
        let file = dir.join(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&file, content).expect("Failed to write file");
    }
    git(dir, &["add", "--all"]);
    git(dir, &["commit", "--quiet", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

/// A product with a patch-management root and a two-commit upstream.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
    pub rev1: String,
    pub rev2: String,
}

impl TestFixture {
    /// Create the upstream repository and an empty patch-management root.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let upstream = temp_dir.path().join("upstream");
        init_git_repo(&upstream);
        let rev1 = commit_files(
            &upstream,
            &[("dummy.txt", "v1\n"), ("lines.txt", LINES_REV1)],
            "Initial commit",
        );
        let rev2 = commit_files(
            &upstream,
            &[("dummy.txt", "v1\nv2\n"), ("lines.txt", LINES_REV2)],
            "Second commit",
        );
        temp_dir
            .child("product/patch_system")
            .create_dir_all()
            .expect("Failed to create root");
        Self { temp_dir, rev1, rev2 }
    }

    /// Pin the fixture dependency to `rev`.
    pub fn with_lock(self, rev: &str) -> Self {
        self.write_lock(&[(DEP, rev, "src/test_repo")]);
        self
    }

    pub fn with_lock_at_rev1(self) -> Self {
        let rev = self.rev1.clone();
        self.with_lock(&rev)
    }

    /// Overwrite the lock file with `(name, rev, path)` entries, all cloning
    /// the fixture upstream.
    pub fn write_lock(&self, entries: &[(&str, &str, &str)]) {
        let repos: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(name, rev, path)| {
                (
                    name.to_string(),
                    serde_json::json!({
                        "url": self.upstream().display().to_string(),
                        "rev": rev,
                        "path": path,
                    }),
                )
            })
            .collect();
        let doc = serde_json::json!({ "repos": repos });
        fs::write(
            self.root().join("deps.lock.json"),
            serde_json::to_string_pretty(&doc).expect("Failed to serialize lock"),
        )
        .expect("Failed to write lock file");
    }

    /// Add a patch file for `dependency`.
    pub fn with_patch(self, dependency: &str, name: &str, content: &str) -> Self {
        self.add_patch(dependency, name, content);
        self
    }

    pub fn add_patch(&self, dependency: &str, name: &str, content: &str) {
        let dir = self.root().join("patches").join(dependency);
        fs::create_dir_all(&dir).expect("Failed to create patch dir");
        fs::write(dir.join(name), content).expect("Failed to write patch");
    }

    pub fn upstream(&self) -> PathBuf {
        self.temp_dir.path().join("upstream")
    }

    /// The patch-management root.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("product/patch_system")
    }

    /// Checkout location of the fixture dependency.
    pub fn checkout(&self) -> PathBuf {
        self.checkout_at("src/test_repo")
    }

    pub fn checkout_at(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join("product").join(path)
    }

    pub fn patch_dir(&self, dependency: &str) -> PathBuf {
        self.root().join("patches").join(dependency)
    }

    /// Sorted file names in a dependency's patch directory.
    pub fn patch_names(&self, dependency: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.patch_dir(dependency)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn read_checkout(&self, path: &str) -> String {
        fs::read_to_string(self.checkout().join(path)).expect("Failed to read checkout file")
    }

    pub fn write_checkout(&self, path: &str, content: &str) {
        fs::write(self.checkout().join(path), content).expect("Failed to write checkout file");
    }

    /// Paths currently staged in the checkout.
    pub fn staged(&self) -> String {
        git(&self.checkout(), &["diff", "--cached", "--name-only"])
    }

    /// A manager over the fixture root, loading the current lock file.
    pub fn manager(&self) -> PatchManager {
        PatchManager::open(Layout::new(self.root())).expect("Failed to open lock file")
    }

    /// A `vendor-patch` command running inside the patch-management root.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vendor-patch");
        cmd.current_dir(self.root())
            .env_remove("VENDOR_PATCH_ROOT")
            .env_remove("VENDOR_PATCH_LOCK")
            .env_remove("VENDOR_PATCH_CHECKOUT_ROOT")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
