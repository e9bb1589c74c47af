//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Marketplace feed ingestion: category tree resolution, offer classification and record export
#[derive(Parser, Debug)]
#[command(name = "feedcat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./feedcat.toml)
    #[arg(short, long, global = true, env = "FEEDCAT_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show category hierarchy as tree
    Tree {
        /// Feed file (default: data_dir/target_filename)
        #[arg(value_hint = ValueHint::FilePath)]
        feed: Option<PathBuf>,
    },

    /// List resolved category paths
    Paths {
        /// Feed file (default: data_dir/target_filename)
        #[arg(value_hint = ValueHint::FilePath)]
        feed: Option<PathBuf>,
    },

    /// Classify category ids into levels
    Classify {
        /// Feed file (default: data_dir/target_filename)
        #[arg(value_hint = ValueHint::FilePath)]
        feed: Option<PathBuf>,
        /// Category ids to classify
        #[arg(short = 'i', long = "category", required = true, num_args = 1..)]
        categories: Vec<String>,
    },

    /// Convert offers to JSON-lines records
    Ingest {
        /// Feed file (default: data_dir/target_filename)
        #[arg(value_hint = ValueHint::FilePath)]
        feed: Option<PathBuf>,
        /// Output file (default: settings output, else stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
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

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
