// src/miner/algorithm/mod.rs
//! Mining algorithm implementations
//!
//! Contains the digest function driving the nonce search and its common
//! interface. The only algorithm this chain uses is Keccak-256, built on
//! the Keccak-f[1600] permutation implemented in [`keccak`].

/// Keccak-256 sponge implementation
///
/// Implements the Keccak-f[1600] permutation (24 rounds) with the
/// original Keccak padding (0x01 domain suffix), rate 1088 bits and
/// capacity 512 bits.
pub mod keccak;

use crate::utils::error::MinerError;

/// Common interface for candidate digest functions
///
/// The scheduler drives the nonce search through this trait so the digest
/// computation stays independent of stream and lane assignment.
pub trait Algorithm: Send + Sync {
    /// Compute the digest for a message prefix and nonce
    ///
    /// # Arguments
    /// * `prefix` - Job-derived message bytes (address and last-mined marker)
    /// * `nonce` - The nonce value to fold into the message
    ///
    /// # Returns
    /// 32-byte digest, or an error if the assembled message violates the
    /// single-block contract
    fn hash(&self, prefix: &[u8], nonce: u64) -> Result<[u8; 32], MinerError>;
}

pub use keccak::Keccak256;
