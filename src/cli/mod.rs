//! CLI module
//!
//! Command-line interface for driving a target adapter.
//!
//! # Commands
//!
//! - `replay` - Feed change events from a JSON-lines file into the target
//! - `check` - Verify the configured sink service is reachable

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
