//! # CLI Command Implementations
//!
//! Each subcommand of `vendor-patch` lives in its own file with:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` plus the global
//!   options and calls into the `vendor_patch` library.
//!
//! Commands that process several dependencies print one line per dependency
//! and fail (exit status 1) when any of them failed.

pub mod apply;
pub mod completions;
pub mod harvest;
pub mod list;
pub mod status;
pub mod sync;

use anyhow::Result;

use vendor_patch::output::OutputConfig;
use vendor_patch::report::{BatchReport, RunOutcome};

/// One line per dependency; failures go to stderr.
pub(crate) fn print_batch<T: RunOutcome>(out: &OutputConfig, batch: &BatchReport<T>) {
    for report in &batch.reports {
        if report.succeeded() {
            println!("{} {}: {}", out.ok(), out.name(&report.dependency), report.summary());
        } else {
            eprintln!("{} {}: {}", out.failed(), out.name(&report.dependency), report.summary());
        }
    }
    if batch.stopped_early {
        eprintln!(
            "{} stopped after the first failure; use --keep-going to attempt the rest",
            out.warning()
        );
    }
}

/// Turn a failed batch into the command's error.
pub(crate) fn finish<T: RunOutcome>(batch: &BatchReport<T>, verb: &str) -> Result<()> {
    if batch.is_success() {
        return Ok(());
    }
    anyhow::bail!(
        "{} failed for {} of {} dependencies",
        verb,
        batch.failure_count(),
        batch.reports.len()
    )
}
