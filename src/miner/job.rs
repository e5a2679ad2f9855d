// src/miner/job.rs
//! Mining job snapshot and candidate types
//!
//! A [`MiningJob`] is immutable for the duration of a launch: the
//! controller client builds a fresh job when parameters change and swaps
//! it in atomically, so the search never mixes old and new bounds.

use crate::config::Config;
use crate::miner::difficulty::{Comparator, DifficultyWindow};
use crate::types::ShareTier;
use crate::utils::error::MinerError;

/// One round's immutable work parameters
#[derive(Debug, Clone)]
pub struct MiningJob {
    /// Address the miner credits shares to
    pub address: String,
    /// Marker of the last block the controller saw mined
    pub last_mined: String,
    /// Full- and minor-tier difficulty windows
    pub comparator: Comparator,
    /// Nonce the search space starts from under these parameters
    pub start_nonce: u64,
}

impl MiningJob {
    /// Builds the initial job from the validated configuration
    ///
    /// # Errors
    /// `MinerError::NumericError` if any difficulty string fails to parse
    /// or a window is inverted. Fatal at startup: the miner cannot safely
    /// search without a target.
    pub fn from_config(config: &Config) -> Result<Self, MinerError> {
        let full = DifficultyWindow::parse(&config.difficulty_lower, &config.difficulty_upper)?;
        let minor = DifficultyWindow::parse(&config.minor_lower, &config.minor_upper)?;

        Ok(MiningJob {
            address: config.address.clone(),
            last_mined: config.last_mined.clone(),
            comparator: Comparator::new(full, minor),
            start_nonce: config.start_nonce,
        })
    }

    /// Whether another job carries the same search parameters
    ///
    /// The starting nonce is excluded from the comparison: it tracks
    /// local search progress, not anything the controller issued.
    pub fn same_parameters(&self, other: &MiningJob) -> bool {
        self.address == other.address
            && self.last_mined == other.last_mined
            && self.comparator == other.comparator
    }

    /// Message prefix every candidate under this job hashes
    ///
    /// The scheduler appends the hex-encoded nonce to this prefix; the
    /// assembled message must fit a single sponge rate block.
    pub fn message_prefix(&self) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(self.address.len() + self.last_mined.len());
        prefix.extend_from_slice(self.address.as_bytes());
        prefix.extend_from_slice(self.last_mined.as_bytes());
        prefix
    }
}

/// A nonce that produced a qualifying digest
///
/// Transient: produced by the scheduler, classified during harvest and
/// discarded once the controller client has submitted it (or its job
/// snapshot went stale).
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Nonce that produced the digest
    pub nonce: u64,
    /// The 256-bit digest
    pub digest: [u8; 32],
    /// Credit tier the digest qualified for
    pub tier: ShareTier,
}
