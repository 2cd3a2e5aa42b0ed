//! # Sync Command Implementation
//!
//! Clones missing checkouts, recovers directories that are not repositories
//! and detaches every checkout at its pinned revision with a pristine tree.
//! Stops at the first failing dependency unless `--keep-going` is given.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use vendor_patch::manager::BatchOptions;

use super::{finish, print_batch};
use crate::cli::GlobalArgs;

/// Clone or update every checkout to its pinned revision
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Only sync the named dependency (repeatable)
    #[arg(long, value_name = "NAME")]
    pub only: Vec<String>,

    /// Continue with the remaining dependencies after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Sync dependencies concurrently
    #[arg(long)]
    pub parallel: bool,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let manager = global.manager()?;

    let spinner = spinner(out.use_color);
    spinner.set_message(format!(
        "Syncing {} dependencies...",
        manager.lock_file().select(&args.only)?.len()
    ));

    let options = BatchOptions {
        keep_going: args.keep_going,
        parallel: args.parallel,
    };
    let batch = manager.sync_all(&args.only, options);
    spinner.finish_and_clear();

    let batch = batch?;
    print_batch(&out, &batch);
    finish(&batch, "sync")
}

fn spinner(visible: bool) -> ProgressBar {
    if !visible || !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
