//! mminer - Keccak proof-of-work pool miner in Rust
//!
//! This crate provides a complete implementation of a Keccak-256
//! proof-of-work miner with support for:
//! - Bit-exact Keccak-f[1600] candidate digests
//! - Gap-free nonce scheduling across concurrent execution streams
//! - Two-tier difficulty classification (full and minor shares)
//! - Controller polling and share submission with bounded retry

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation: digest, difficulty, scheduling, mining loop
pub mod miner;

/// Network communication with the mining-pool controller
pub mod network;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{Algorithm, Candidate, Keccak256, MiningJob, Orchestrator, Scheduler};
pub use network::{ControllerClient, ControllerConfig};
pub use stats::{HardwareStats, MiningStats, StatsReporter};
pub use types::ShareTier;
pub use utils::{MinerError, init_logging};
