//! # Harvest Command Implementation
//!
//! Captures the modifications of one dependency's checkout as its new patch
//! set. The previous patches are discarded, so when some exist and the
//! command runs on a terminal the operator is asked first (`--yes` skips the
//! question; without a terminal the patches are replaced).

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use vendor_patch::harvest::{HarvestOptions, HarvestOutcome};
use vendor_patch::report::RunOutcome;
use vendor_patch::store::PatchSet;

use crate::cli::GlobalArgs;

/// Capture a checkout's modifications as its new patch set
#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Dependency to harvest
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Revision to diff against [default: HEAD]
    #[arg(long, value_name = "REV")]
    pub rev: Option<String>,

    /// Show the patches that would be written without writing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Replace existing patches without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `harvest` command.
pub fn execute(args: HarvestArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let manager = global.manager()?;

    let options = HarvestOptions {
        base: args.rev.clone(),
        dry_run: args.dry_run,
    };
    let interactive = !args.yes && console::Term::stdout().is_term();

    let outcome = manager.harvest(&args.name, &options, |existing, fresh| {
        !interactive || confirm_replace(existing, fresh)
    })?;

    match &outcome {
        HarvestOutcome::Harvested { set, .. } => print_set(set),
        HarvestOutcome::Unchanged | HarvestOutcome::Declined => {}
    }
    println!("{} {}: {}", out.ok(), out.name(&args.name), outcome.summary());
    Ok(())
}

fn confirm_replace(existing: &PatchSet, fresh: &PatchSet) -> bool {
    let dropped: Vec<&str> = existing
        .names()
        .into_iter()
        .filter(|name| fresh.get(name).is_none())
        .collect();
    if !dropped.is_empty() {
        println!("These patches will be removed:");
        for name in &dropped {
            println!("  - {}", name);
        }
    }

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Replace {} existing patches with {} harvested ones?",
            existing.len(),
            fresh.len()
        ))
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn print_set(set: &PatchSet) {
    for patch in set {
        println!("  {} ({} bytes)", patch.name, patch.content.len());
    }
}
