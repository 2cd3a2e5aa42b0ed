//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use vendor_patch::layout::Layout;
use vendor_patch::manager::PatchManager;
use vendor_patch::output::OutputConfig;

use crate::commands;

/// Vendor Patch - Pin vendored git checkouts and keep local patches on top
#[derive(Parser, Debug)]
#[command(name = "vendor-patch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Patch-management root holding the lock file and the patch directories
    #[arg(long, global = true, value_name = "DIR", env = "VENDOR_PATCH_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Lock file [default: <root>/deps.lock.json]
    #[arg(long, global = true, value_name = "FILE", env = "VENDOR_PATCH_LOCK")]
    pub lock: Option<PathBuf>,

    /// Directory the checkout paths are relative to [default: parent of <root>]
    #[arg(long, global = true, value_name = "DIR", env = "VENDOR_PATCH_CHECKOUT_ROOT")]
    pub checkout_root: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn layout(&self) -> Layout {
        Layout::resolve(self.root.clone(), self.lock.clone(), self.checkout_root.clone())
    }

    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// Load the lock file and build a manager backed by the system `git`.
    pub fn manager(&self) -> Result<PatchManager> {
        Ok(PatchManager::open(self.layout())?)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone or update every checkout to its pinned revision
    Sync(commands::sync::SyncArgs),

    /// Apply the stored patches on top of the checkouts
    Apply(commands::apply::ApplyArgs),

    /// Capture a checkout's modifications as its new patch set
    Harvest(commands::harvest::HarvestArgs),

    /// Show checkout state and patch counts
    Status(commands::status::StatusArgs),

    /// List dependencies and their patches as a tree
    List(commands::list::ListArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global.log_level);

        match self.command {
            Commands::Sync(args) => commands::sync::execute(args, &self.global),
            Commands::Apply(args) => commands::apply::execute(args, &self.global),
            Commands::Harvest(args) => commands::harvest::execute(args, &self.global),
            Commands::Status(args) => commands::status::execute(args, &self.global),
            Commands::List(args) => commands::list::execute(args, &self.global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
