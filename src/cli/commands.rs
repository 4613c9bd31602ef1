//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// adasink target adapter CLI
#[derive(Parser, Debug)]
#[command(name = "adasink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Adapter configuration file (YAML)
    #[arg(short, long, global = true, default_value = "adasink.yaml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay captured change events from a JSON-lines file
    ///
    /// Each line is either a change event
    /// `{"op": "create", "type": "EMPL", "record": {...}}`
    /// or a commit marker `{"commit": "tx-1"}`.
    Replay {
        /// Event file to replay
        #[arg(short, long)]
        events: PathBuf,

        /// Commit whatever is still buffered at end of file
        #[arg(long)]
        commit_rest: bool,
    },

    /// Verify the configured sink service is reachable
    Check,
}
