// src/config/config.rs
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the mining application
///
/// One immutable-per-cycle bundle of everything the core needs before the
/// first launch: identity, difficulty bounds for both tiers, starting
/// nonce, controller endpoint, launch geometry and device selection. The
/// core trusts these values were validated by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the miner credits shares to
    #[serde(default = "default_address")]
    pub address: String,

    /// Last-mined block marker included in every candidate message
    #[serde(default = "default_last_mined")]
    pub last_mined: String,

    /// Full-tier inclusive upper bound (decimal or 0x-hex string)
    #[serde(default = "default_difficulty")]
    pub difficulty_upper: String,

    /// Full-tier inclusive lower bound
    #[serde(default = "default_zero")]
    pub difficulty_lower: String,

    /// Minor-tier inclusive upper bound
    #[serde(default = "default_zero")]
    pub minor_upper: String,

    /// Minor-tier inclusive lower bound
    #[serde(default = "default_zero")]
    pub minor_lower: String,

    /// Nonce the search starts from
    #[serde(default)]
    pub start_nonce: u64,

    /// Controller base URL
    #[serde(default = "default_controller")]
    pub controller: String,

    /// Whether to poll the controller (disabled in test mode)
    #[serde(default = "default_true")]
    pub use_controller: bool,

    /// Test mode: mine against the fixed local parameters only
    #[serde(default)]
    pub test: bool,

    /// Compute device index selected by the external device selector
    #[serde(default)]
    pub device: usize,

    /// Concurrently executing streams per launch
    #[serde(default = "default_streams")]
    pub streams: usize,

    /// Blocks per stream
    #[serde(default = "default_blocks")]
    pub blocks: u64,

    /// Lanes per block
    #[serde(default = "default_block_width")]
    pub block_width: u64,

    /// Seconds between controller polls
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

fn default_address() -> String {
    "0xE8946EC499a839c72E60bA7d437E28cd73a3f487".into()
}

fn default_last_mined() -> String {
    "0x422000000003B0019000000".into()
}

fn default_difficulty() -> String {
    "5731203885580".into()
}

fn default_zero() -> String {
    "0".into()
}

fn default_controller() -> String {
    "http://trust-in.info:17395".into()
}

fn default_true() -> bool {
    true
}

fn default_streams() -> usize {
    5
}

fn default_blocks() -> u64 {
    20_000
}

fn default_block_width() -> u64 {
    128
}

fn default_poll_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        // serde's field defaults double as the programmatic defaults
        toml::from_str("").expect("empty config must deserialize from defaults")
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&config_str)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Generates a configuration template string
    ///
    /// # Returns
    /// String containing a commented TOML configuration template with the
    /// stock controller parameters filled in
    pub fn generate_template() -> String {
        let mut template = String::new();
        template.push_str("# mminer configuration\n\n");
        template.push_str("# Identity credited for every share\n");
        template.push_str("address = \"0xE8946EC499a839c72E60bA7d437E28cd73a3f487\"\n");
        template.push_str("last_mined = \"0x422000000003B0019000000\"\n\n");
        template.push_str("# Difficulty windows (decimal or 0x-hex, inclusive bounds)\n");
        template.push_str("difficulty_upper = \"5731203885580\"\n");
        template.push_str("difficulty_lower = \"0\"\n");
        template.push_str("minor_upper = \"0\"\n");
        template.push_str("minor_lower = \"0\"\n\n");
        template.push_str("# Search start and launch geometry\n");
        template.push_str("start_nonce = 0\n");
        template.push_str("streams = 5\n");
        template.push_str("blocks = 20000\n");
        template.push_str("block_width = 128\n");
        template.push_str("device = 0\n\n");
        template.push_str("# Controller connection\n");
        template.push_str("controller = \"http://trust-in.info:17395\"\n");
        template.push_str("use_controller = true\n");
        template.push_str("poll_secs = 30\n");
        template.push_str("# Test mode mines against the local parameters only\n");
        template.push_str("test = false\n");
        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_kernel_defaults() {
        let config = Config::default();
        assert_eq!(config.controller, "http://trust-in.info:17395");
        assert_eq!(config.difficulty_upper, "5731203885580");
        assert_eq!(config.streams, 5);
        assert_eq!(config.blocks, 20_000);
        assert_eq!(config.block_width, 128);
        assert_eq!(config.poll_secs, 30);
        assert!(config.use_controller);
        assert!(!config.test);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config: Config =
            toml::from_str("address = \"0xdead\"\nstreams = 2\n").unwrap();
        assert_eq!(config.address, "0xdead");
        assert_eq!(config.streams, 2);
        assert_eq!(config.blocks, 20_000, "unnamed fields keep their defaults");
    }

    #[test]
    fn generated_template_parses_back() {
        let config: Config = toml::from_str(&Config::generate_template()).unwrap();
        assert_eq!(config.address, Config::default().address);
    }
}
