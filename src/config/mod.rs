// src/config/mod.rs
//! Configuration management for the miner
//!
//! Handles all configuration-related functionality including loading and
//! parsing TOML configuration files and generating templates. The rest of
//! the core consumes the resulting [`Config`] record and never re-reads
//! configuration sources.

/// Core configuration implementation
///
/// Contains the [`Config`] struct defining the miner's configuration
/// structure and defaults.
pub mod config;

// Re-export key items for easy access
pub use config::Config;

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read or parsed
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Generates a commented configuration template
///
/// # Returns
/// String containing a ready-to-use TOML configuration template
pub fn generate_template() -> String {
    Config::generate_template()
}
