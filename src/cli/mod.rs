//! Command-line interface for promptmaster.
//!
//! Provides commands for running the optimization pipeline, quick
//! routing analysis, and listing the specialist catalog.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
