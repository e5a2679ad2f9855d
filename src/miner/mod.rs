// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components of the nonce search:
//! - The Keccak-256 digest core
//! - Difficulty classification against the full and minor tiers
//! - Stream scheduling across the nonce space
//! - The orchestrating mining loop

/// Digest function implementations
///
/// Contains the Keccak-f[1600] sponge and the `Algorithm` trait the
/// scheduler drives it through.
pub mod algorithm;

/// Difficulty windows and share classification
pub mod difficulty;

/// Mining job snapshots and candidate types
pub mod job;

/// Nonce search scheduler
///
/// Partitions the nonce space into per-stream slots and harvests
/// qualifying candidates from concurrent launches.
pub mod scheduler;

/// Mining loop orchestrator
///
/// Drives Launching/Harvesting/Reporting rounds against stable job
/// snapshots and hands shares to the controller client.
pub mod orchestrator;

// Re-export main components for cleaner imports
pub use self::algorithm::{Algorithm, Keccak256};
pub use self::difficulty::{Comparator, DifficultyWindow};
pub use self::job::{Candidate, MiningJob};
pub use self::orchestrator::{MinerState, Orchestrator};
pub use self::scheduler::{LaunchGeometry, Scheduler, StreamSlot};
