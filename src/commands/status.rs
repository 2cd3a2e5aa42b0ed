//! # Status Command Implementation
//!
//! Read-only overview: for every dependency, whether its checkout exists,
//! whether HEAD sits on the pinned revision, whether the tree carries
//! modifications and how many patches are stored.

use anyhow::Result;
use clap::Args;

use vendor_patch::manager::{CheckoutState, DependencyStatus};
use vendor_patch::output::OutputConfig;
use vendor_patch::sync::short_id;

use crate::cli::GlobalArgs;

/// Show checkout state and patch counts
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show the named dependency (repeatable)
    #[arg(long, value_name = "NAME")]
    pub only: Vec<String>,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let manager = global.manager()?;
    manager.lock_file().select(&args.only)?;

    for status in manager.status()? {
        if args.only.is_empty() || args.only.contains(&status.name) {
            println!("{}", describe(&out, &status));
        }
    }
    Ok(())
}

fn describe(out: &OutputConfig, status: &DependencyStatus) -> String {
    let (marker, state) = match &status.state {
        CheckoutState::Missing => (out.warning(), "not checked out".to_string()),
        CheckoutState::NotRepository => (out.failed(), "not a git repository".to_string()),
        CheckoutState::Ready { head, pinned, dirty } => {
            let mut text = format!("at {}", short_id(head));
            match pinned {
                Some(true) => {}
                Some(false) => text.push_str(&format!(", pinned to {}", status.rev)),
                None => text.push_str(&format!(", {} not fetched", status.rev)),
            }
            if *dirty {
                text.push_str(", modified");
            }
            let marker = if *pinned == Some(true) {
                out.ok()
            } else {
                out.warning()
            };
            (marker, text)
        }
    };
    format!(
        "{} {}: {} [{} patches] {}",
        marker,
        out.name(&status.name),
        state,
        status.patches.len(),
        status.checkout.display()
    )
}
