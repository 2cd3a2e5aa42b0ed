//! # Completions Command Implementation
//!
//! Generates shell completion scripts with `clap_complete`, either to stdout
//! or straight into a file:
//!
//! ```bash
//! vendor-patch completions bash > ~/.local/share/bash-completion/completions/vendor-patch
//! vendor-patch completions zsh --output ~/.zfunc/_vendor-patch
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

const BIN_NAME: &str = "vendor-patch";

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            render(args.shell, &mut file)?;
        }
        None => render(args.shell, &mut io::stdout().lock())?,
    }
    Ok(())
}

fn render(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}
