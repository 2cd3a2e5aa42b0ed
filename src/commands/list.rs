//! # List Command Implementation
//!
//! Prints the lock file as a tree: one node per dependency, with its stored
//! patches as children in the order they are applied.
//!
//! This command is read-only and never runs git.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use vendor_patch::manager::PatchManager;

use crate::cli::GlobalArgs;

/// List dependencies and their patches as a tree
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Omit the patch files
    #[arg(long)]
    pub no_patches: bool,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let manager = global.manager()?;
    let tree = build_tree(&manager, !args.no_patches)?;
    print_tree(&tree).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

fn build_tree(manager: &PatchManager, with_patches: bool) -> Result<TreeNode> {
    let store = manager.store();
    let mut children = Vec::new();
    for dep in manager.lock_file().dependencies() {
        let patches = if with_patches {
            store
                .load(&dep.name)?
                .names()
                .into_iter()
                .map(TreeNode::leaf)
                .collect()
        } else {
            Vec::new()
        };
        children.push(TreeNode {
            label: format!("{} @ {} -> {}", dep.name, dep.rev, dep.path),
            children: patches,
        });
    }
    Ok(TreeNode {
        label: manager.layout().lock_file.display().to_string(),
        children,
    })
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: &str) -> Self {
        Self {
            label: label.to_string(),
            children: vec![],
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
