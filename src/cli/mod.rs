// src/cli/mod.rs
//! Command-line interface definitions
//!
//! Declares the miner's subcommands and their options. Argument parsing
//! produces a fully populated configuration record before the core
//! starts; the core never touches the CLI layer.

/// Subcommand and option definitions
pub mod commands;

// Re-export for easier access
pub use commands::{Action, BenchmarkOptions, Commands, ConfigOptions, StartOptions};
