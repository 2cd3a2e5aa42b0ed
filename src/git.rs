//! # Git Collaborator
//!
//! Every version-control primitive the engine needs goes through the
//! [`GitOperations`] trait. [`SystemGit`] implements it by running the system
//! `git` binary, which automatically picks up:
//!
//! - SSH keys from `~/.ssh/`
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in `~/.gitconfig`
//!
//! The trait is the seam used by tests to replace real repositories with a
//! scripted mock when only the orchestration logic is under test.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use log::debug;
use url::Url;

use crate::error::{Error, Result};

/// How `git apply` should treat context mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Exact contextual match only.
    Exact,
    /// Fall back to a three-way merge using the blob ids embedded in the diff.
    ThreeWay,
}

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Full clone of `url` into `target_dir` (which must not exist).
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()>;

    /// Whether `dir` is the top level of a git working tree.
    fn is_repository(&self, dir: &Path) -> bool;

    /// Fetch branches and tags from `origin`.
    fn fetch(&self, dir: &Path) -> Result<()>;

    /// Check out `rev` as a detached HEAD, discarding local changes.
    fn checkout_detached(&self, dir: &Path, rev: &str) -> Result<()>;

    /// `reset --hard HEAD`.
    fn reset_hard(&self, dir: &Path) -> Result<()>;

    /// Remove untracked files and directories, optionally ignored ones too.
    fn clean(&self, dir: &Path, include_ignored: bool) -> Result<()>;

    /// Commit id of HEAD.
    fn head(&self, dir: &Path) -> Result<String>;

    /// Commit id `rev` resolves to.
    fn resolve(&self, dir: &Path, rev: &str) -> Result<String>;

    /// Dry-run application of `patch`; `Ok` means it would apply cleanly.
    fn check_patch(&self, dir: &Path, patch: &[u8], reverse: bool) -> Result<()>;

    /// Apply `patch` to the working tree.
    fn apply_patch(&self, dir: &Path, patch: &[u8], mode: ApplyMode) -> Result<()>;

    /// Stage every tracked and untracked change (`add -A`).
    fn stage_all(&self, dir: &Path) -> Result<()>;

    /// Paths whose staged content differs from `base`, without rename pairing.
    fn staged_paths(&self, dir: &Path, base: &str) -> Result<Vec<String>>;

    /// Binary-safe diff of one staged path against `base`.
    fn staged_diff(&self, dir: &Path, base: &str, path: &str) -> Result<Vec<u8>>;

    /// Empty the index back to HEAD without touching the working tree.
    fn unstage_all(&self, dir: &Path) -> Result<()>;

    /// Whether the working tree has any tracked or untracked modification.
    fn is_dirty(&self, dir: &Path) -> Result<bool>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
#[derive(Debug, Clone, Default)]
pub struct SystemGit;

impl SystemGit {
    fn command(dir: &Path, args: &[&str]) -> Command {
        debug!("git {} (in {})", args.join(" "), dir.display());
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(dir);
        cmd
    }

    fn run(dir: &Path, args: &[&str]) -> Result<Output> {
        let output = Self::command(dir, args)
            .output()
            .map_err(|e| command_error(dir, args, e.to_string()))?;
        check_status(dir, args, output)
    }

    fn run_with_input(dir: &Path, args: &[&str], input: &[u8]) -> Result<Output> {
        let mut child = Self::command(dir, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_error(dir, args, e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input)?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| command_error(dir, args, e.to_string()))?;
        check_status(dir, args, output)
    }
}

fn command_error(dir: &Path, args: &[&str], stderr: String) -> Error {
    Error::GitCommand {
        command: args.join(" "),
        dir: dir.to_path_buf(),
        stderr,
    }
}

fn check_status(dir: &Path, args: &[&str], output: Output) -> Result<Output> {
    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(command_error(dir, args, stderr))
    }
}

fn stdout_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

impl GitOperations for SystemGit {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()> {
        let parent = match target_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        let name = target_dir
            .file_name()
            .ok_or_else(|| {
                command_error(&parent, &["clone", url], "invalid clone target".to_string())
            })?
            .to_string_lossy()
            .into_owned();
        Self::run(&parent, &["clone", "--quiet", url, &name])?;
        Ok(())
    }

    fn is_repository(&self, dir: &Path) -> bool {
        if !dir.join(".git").exists() {
            return false;
        }
        // A broken `.git` inside a host repository would otherwise resolve to
        // the host's top level.
        let Ok(output) = Self::run(dir, &["rev-parse", "--show-toplevel"]) else {
            return false;
        };
        let toplevel = PathBuf::from(stdout_line(&output));
        match (toplevel.canonicalize(), dir.canonicalize()) {
            (Ok(top), Ok(dir)) => top == dir,
            _ => false,
        }
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        Self::run(dir, &["fetch", "--quiet", "--tags", "origin"])?;
        Ok(())
    }

    fn checkout_detached(&self, dir: &Path, rev: &str) -> Result<()> {
        Self::run(dir, &["checkout", "--quiet", "--force", "--detach", rev])?;
        Ok(())
    }

    fn reset_hard(&self, dir: &Path) -> Result<()> {
        Self::run(dir, &["reset", "--quiet", "--hard", "HEAD"])?;
        Ok(())
    }

    fn clean(&self, dir: &Path, include_ignored: bool) -> Result<()> {
        let flags = if include_ignored { "-fdx" } else { "-fd" };
        Self::run(dir, &["clean", "--quiet", flags])?;
        Ok(())
    }

    fn head(&self, dir: &Path) -> Result<String> {
        Ok(stdout_line(&Self::run(dir, &["rev-parse", "HEAD"])?))
    }

    fn resolve(&self, dir: &Path, rev: &str) -> Result<String> {
        let spec = format!("{}^{{commit}}", rev);
        Ok(stdout_line(&Self::run(
            dir,
            &["rev-parse", "--verify", "--quiet", &spec],
        )?))
    }

    fn check_patch(&self, dir: &Path, patch: &[u8], reverse: bool) -> Result<()> {
        let mut args = vec!["apply", "--check", "--whitespace=nowarn"];
        if reverse {
            args.push("--reverse");
        }
        args.push("-");
        Self::run_with_input(dir, &args, patch)?;
        Ok(())
    }

    fn apply_patch(&self, dir: &Path, patch: &[u8], mode: ApplyMode) -> Result<()> {
        let mut args = vec!["apply", "--whitespace=nowarn"];
        if mode == ApplyMode::ThreeWay {
            args.push("--3way");
        }
        args.push("-");
        Self::run_with_input(dir, &args, patch)?;
        Ok(())
    }

    fn stage_all(&self, dir: &Path) -> Result<()> {
        Self::run(dir, &["add", "--all"])?;
        Ok(())
    }

    fn staged_paths(&self, dir: &Path, base: &str) -> Result<Vec<String>> {
        let output = Self::run(
            dir,
            &["diff", "--cached", "--name-only", "-z", "--no-renames", base],
        )?;
        Ok(output
            .stdout
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| String::from_utf8_lossy(entry).into_owned())
            .collect())
    }

    fn staged_diff(&self, dir: &Path, base: &str, path: &str) -> Result<Vec<u8>> {
        let pathspec = literal_pathspec(path);
        let output = Self::run(
            dir,
            &[
                "diff",
                "--cached",
                "--binary",
                "--no-renames",
                "--no-color",
                "--no-ext-diff",
                base,
                "--",
                &pathspec,
            ],
        )?;
        Ok(output.stdout)
    }

    fn unstage_all(&self, dir: &Path) -> Result<()> {
        Self::run(dir, &["reset", "--quiet", "HEAD"])?;
        Ok(())
    }

    fn is_dirty(&self, dir: &Path) -> Result<bool> {
        let output = Self::run(dir, &["status", "--porcelain"])?;
        Ok(!output.stdout.is_empty())
    }
}

/// Pathspec matching exactly `path`, with glob characters taken literally.
fn literal_pathspec(path: &str) -> String {
    format!(":(literal){}", path)
}

/// Strip credentials from a remote URL before it is logged.
///
/// Local paths and scp-like addresses (`git@host:org/repo`) are returned
/// unchanged.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed)
            if parsed.has_host()
                && (!parsed.username().is_empty() || parsed.password().is_some()) =>
        {
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

/// Remediation hint for common clone/fetch failures.
pub fn failure_hint(stderr: &str) -> Option<&'static str> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some("check SSH keys, credential helpers or access tokens for this remote")
    } else if stderr.contains("Could not resolve host") {
        Some("check network connectivity and the remote URL")
    } else if stderr.contains("did not match any")
        || stderr.contains("unknown revision")
        || stderr.contains("reference is not a tree")
    {
        Some("the pinned revision does not exist on the remote; check `rev` in the lock file")
    } else {
        None
    }
}
