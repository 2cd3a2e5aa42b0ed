//! # Apply Command Implementation
//!
//! Layers each dependency's stored patches on top of its checkout. Every
//! dependency is attempted; a conflict is reported with the patch that
//! stopped it and makes the command fail once all dependencies are done.

use anyhow::Result;
use clap::Args;

use vendor_patch::apply::{ApplyOptions, ApplyOutcome, ApplyRun};
use vendor_patch::manager::BatchOptions;
use vendor_patch::output::OutputConfig;
use vendor_patch::report::BatchReport;

use super::{finish, print_batch};
use crate::cli::GlobalArgs;

/// Apply the stored patches on top of the checkouts
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Only apply to the named dependency (repeatable)
    #[arg(long, value_name = "NAME")]
    pub only: Vec<String>,

    /// Apply on top of the current tree instead of resetting it first
    #[arg(long)]
    pub no_reset: bool,

    /// Write an audit record per applied patch under patchinfo/
    #[arg(long)]
    pub record: bool,

    /// Apply to dependencies concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Show the outcome of every patch
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the `apply` command.
pub fn execute(args: ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let manager = global.manager()?;

    let apply = ApplyOptions {
        reset: !args.no_reset,
        record: args.record,
    };
    let options = BatchOptions {
        keep_going: true,
        parallel: args.parallel,
    };
    let batch = manager.apply_all(&args.only, &apply, options)?;

    print_batch(&out, &batch);
    if args.verbose {
        print_patches(&out, &batch);
    }
    finish(&batch, "apply")
}

fn print_patches(out: &OutputConfig, batch: &BatchReport<ApplyRun>) {
    for report in &batch.reports {
        let Ok(run) = &report.result else { continue };
        for patch in &run.patches {
            let marker = match patch.outcome {
                ApplyOutcome::Conflict => out.failed(),
                _ => out.ok(),
            };
            println!("  {} {} {}", marker, patch.patch, patch.outcome);
        }
    }
}
