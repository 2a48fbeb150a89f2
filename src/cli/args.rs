//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Load an outline file into an observable tree and inspect or prune it
#[derive(Parser, Debug)]
#[command(name = "treeview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug output, repeat for more (-d -d -d)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath, env = "TREEVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Build an indexed (ordered, positional) tree instead of the configured variant
    #[arg(long, global = true)]
    pub indexed: bool,

    /// Print the effective config template and exit
    #[arg(long)]
    pub template: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tree loaded from an outline file
    Show {
        /// Outline file: one path per line, optional `=value`
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Append node values to the keys
        #[arg(short, long)]
        values: bool,
    },

    /// Resolve a path and print the node found there
    Find {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Separator-delimited path below the root
        path: String,
    },

    /// Remove every node whose key starts with a prefix and report the removals
    Prune {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Key prefix of the nodes to remove
        prefix: String,
    },
}
