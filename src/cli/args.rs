//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::config::{Capacity, RawSettings, Strategy};

/// Walk binary trees concurrently and check them for in-order equivalence
#[derive(Parser, Debug)]
#[command(name = "treewalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(long, global = true, env = "TREEWALK_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Traversal strategy
    #[arg(long, global = true, value_enum)]
    pub strategy: Option<Strategy>,

    /// Channel capacity: 0 for an unbuffered handoff, N, or "unbounded"
    #[arg(long, global = true)]
    pub capacity: Option<Capacity>,

    /// Fail walks deeper than this many levels (0 = unlimited)
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Flag values as the highest-precedence settings layer.
    pub fn settings_overlay(&self) -> RawSettings {
        RawSettings {
            strategy: self.strategy,
            capacity: self.capacity,
            max_depth: self.max_depth,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a tree's values in in-order sequence, streamed over a channel
    Walk {
        #[command(flatten)]
        tree: TreeSource,

        /// Print on one line, comma separated
        #[arg(long)]
        inline: bool,
    },

    /// Check two trees for equivalence (exit 0 if equivalent, 1 if not)
    Same {
        /// Left tree values in insertion order
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, conflicts_with = "left_tour")]
        left: Vec<i64>,

        /// Build the left tree from k, 2k, ..., 10k in random order
        #[arg(long)]
        left_tour: Option<i64>,

        /// Right tree values in insertion order
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, conflicts_with = "right_tour")]
        right: Vec<i64>,

        /// Build the right tree from k, 2k, ..., 10k in random order
        #[arg(long)]
        right_tour: Option<i64>,

        /// Seed for random tree shapes
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a tree's shape
    Show {
        #[command(flatten)]
        tree: TreeSource,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where a single tree comes from.
#[derive(Args, Debug, Clone)]
pub struct TreeSource {
    /// Values inserted into a binary search tree in the given order
    #[arg(value_delimiter = ',', allow_negative_numbers = true)]
    pub values: Vec<i64>,

    /// Build the tree from k, 2k, ..., 10k in random order
    #[arg(long, conflicts_with = "values")]
    pub tour: Option<i64>,

    /// Seed for --tour
    #[arg(long, requires = "tour")]
    pub seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a commented config template
    Template,
    /// Print the global config file location
    Path,
}
