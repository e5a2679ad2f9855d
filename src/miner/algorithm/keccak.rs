// src/miner/algorithm/keccak.rs
//! Keccak-f[1600] sponge and the Keccak-256 digest built on it
//!
//! The permutation operates on a 1600-bit state of 25 sixty-four-bit
//! lanes. Input is absorbed into the 1088-bit rate portion (17 lanes);
//! the 512-bit capacity (8 lanes) is never written by input. The miner
//! only ever absorbs a single padded block and squeezes a 256-bit digest
//! from the first four lanes, so no intermediate permutations are needed.
//!
//! Padding uses the original Keccak domain suffix 0x01 (pad10*1), not the
//! SHA3 suffix 0x06.

use crate::miner::algorithm::Algorithm;
use crate::utils::error::MinerError;

/// Sponge rate in bytes (1088 bits, 17 lanes)
pub const RATE_BYTES: usize = 136;

/// Digest length in bytes (256 bits, half the capacity)
pub const DIGEST_BYTES: usize = 32;

/// Number of permutation rounds
const ROUNDS: usize = 24;

/// Domain-separation suffix appended before pad10*1
const SUFFIX: u8 = 0x01;

/// Largest message that still fits one rate block with its padding.
/// The suffix and final pad bit collapse into a single 0x81 byte at the
/// boundary, so exactly one byte of headroom is required.
pub const MAX_MESSAGE_BYTES: usize = RATE_BYTES - 1;

/// Iota round constants
const ROUND_CONSTANTS: [u64; ROUNDS] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808a,
    0x8000000080008000,
    0x000000000000808b,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008a,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000a,
    0x000000008000808b,
    0x800000000000008b,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800a,
    0x800000008000000a,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

/// Rho rotation offsets, indexed as `x + 5 * y`
const RHO_OFFSETS: [u32; 25] = [
    0, 1, 62, 28, 27, //
    36, 44, 6, 55, 20, //
    3, 10, 43, 25, 39, //
    41, 45, 15, 21, 8, //
    18, 2, 61, 56, 14,
];

/// Fixed 1600-bit permutation state
///
/// Created fresh per candidate evaluation and dropped after the digest is
/// extracted; states are never reused across nonces.
#[derive(Clone)]
pub struct PermutationState {
    lanes: [u64; 25],
}

impl PermutationState {
    /// Creates a zero-initialized state
    pub fn new() -> Self {
        PermutationState { lanes: [0u64; 25] }
    }

    /// XORs one padded rate-size block into the rate lanes
    ///
    /// `block` must be exactly [`RATE_BYTES`] long; the caller performs
    /// the padding. Lanes are filled little-endian, as Keccak defines.
    fn absorb_block(&mut self, block: &[u8; RATE_BYTES]) {
        for (i, chunk) in block.chunks_exact(8).enumerate() {
            let lane = u64::from_le_bytes(chunk.try_into().unwrap());
            self.lanes[i] ^= lane;
        }
    }

    /// Applies the full 24-round Keccak-f[1600] permutation
    pub fn permute(&mut self) {
        let a = &mut self.lanes;

        for rc in ROUND_CONSTANTS {
            // theta
            let mut c = [0u64; 5];
            for x in 0..5 {
                c[x] = a[x] ^ a[x + 5] ^ a[x + 10] ^ a[x + 15] ^ a[x + 20];
            }
            for x in 0..5 {
                let d = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
                for y in 0..5 {
                    a[x + 5 * y] ^= d;
                }
            }

            // rho and pi combined: rotate each lane, then move it to its
            // transposed position in a scratch state
            let mut b = [0u64; 25];
            for x in 0..5 {
                for y in 0..5 {
                    let rotated = a[x + 5 * y].rotate_left(RHO_OFFSETS[x + 5 * y]);
                    b[y + 5 * ((2 * x + 3 * y) % 5)] = rotated;
                }
            }

            // chi
            for x in 0..5 {
                for y in 0..5 {
                    a[x + 5 * y] =
                        b[x + 5 * y] ^ (!b[(x + 1) % 5 + 5 * y] & b[(x + 2) % 5 + 5 * y]);
                }
            }

            // iota
            a[0] ^= rc;
        }
    }

    /// Extracts the digest from the first lanes of the rate portion
    pub fn squeeze(&self) -> [u8; DIGEST_BYTES] {
        let mut out = [0u8; DIGEST_BYTES];
        for (i, chunk) in out.chunks_exact_mut(8).enumerate() {
            chunk.copy_from_slice(&self.lanes[i].to_le_bytes());
        }
        out
    }
}

impl Default for PermutationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the Keccak-256 digest of a single-block message
///
/// # Arguments
/// * `message` - Raw message bytes, at most [`MAX_MESSAGE_BYTES`] long
///
/// # Returns
/// - `Ok([u8; 32])` - The digest
/// - `Err(MinerError::ContractViolation)` - If the message does not fit
///   one rate block with its padding. This signals a programming defect
///   in the caller, not a runtime condition.
pub fn keccak256(message: &[u8]) -> Result<[u8; DIGEST_BYTES], MinerError> {
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(MinerError::ContractViolation(format!(
            "Permutation input of {} bytes exceeds single-block limit of {}",
            message.len(),
            MAX_MESSAGE_BYTES
        )));
    }

    // pad10*1 with the 0x01 domain suffix; when the message fills all but
    // the last byte the suffix and the final 1-bit share that byte (0x81)
    let mut block = [0u8; RATE_BYTES];
    block[..message.len()].copy_from_slice(message);
    block[message.len()] ^= SUFFIX;
    block[RATE_BYTES - 1] ^= 0x80;

    let mut state = PermutationState::new();
    state.absorb_block(&block);
    state.permute();
    Ok(state.squeeze())
}

/// Keccak-256 digest function used by the nonce search
///
/// Stateless; every evaluation starts from a zeroed permutation state so
/// no data leaks between candidates. The nonce is folded into the message
/// as sixteen lowercase hex characters, matching the controller's
/// submission encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256;

impl Keccak256 {
    /// Creates a new digest function instance
    pub fn new() -> Self {
        Keccak256
    }

    /// Assembles the candidate message for a prefix and nonce
    fn message(prefix: &[u8], nonce: u64) -> Vec<u8> {
        let mut message = Vec::with_capacity(prefix.len() + 16);
        message.extend_from_slice(prefix);
        message.extend_from_slice(format!("{:016x}", nonce).as_bytes());
        message
    }
}

impl Algorithm for Keccak256 {
    /// Computes the digest for a message prefix and nonce
    ///
    /// # Arguments
    /// * `prefix` - Job-derived message bytes (address and last-mined marker)
    /// * `nonce` - Candidate nonce
    ///
    /// # Returns
    /// - `Ok([u8; 32])` - The digest
    /// - `Err(MinerError)` - If prefix plus encoded nonce overflows the
    ///   single-block contract
    fn hash(&self, prefix: &[u8], nonce: u64) -> Result<[u8; 32], MinerError> {
        keccak256(&Keccak256::message(prefix, nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use tiny_keccak::{Hasher, Keccak};

    /// Published Keccak-256 vector: empty message.
    #[test]
    fn empty_message_matches_reference_vector() {
        let digest = keccak256(b"").unwrap();
        let expected =
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a45b");
        assert_eq!(digest, expected, "Keccak-256(\"\") must match the reference");
    }

    /// Published Keccak-256 vector: "abc".
    #[test]
    fn abc_matches_reference_vector() {
        let digest = keccak256(b"abc").unwrap();
        let expected =
            hex!("4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45");
        assert_eq!(digest, expected, "Keccak-256(\"abc\") must match the reference");
    }

    /// Published Keccak-256 vector: the fox pangram.
    #[test]
    fn pangram_matches_reference_vector() {
        let digest = keccak256(b"The quick brown fox jumps over the lazy dog").unwrap();
        let expected =
            hex!("4d741b6f1eb29cb2a9b9911c82f56fa8d73b04959d3d9d222895df6c0b28aa15");
        assert_eq!(digest, expected);
    }

    /// Cross-check against an independent implementation over a spread of
    /// message lengths, including both sides of the padding boundary.
    #[test]
    fn agrees_with_tiny_keccak() {
        for len in [0usize, 1, 7, 16, 63, 83, 100, 134, 135] {
            let message: Vec<u8> = (0..len).map(|i| (i * 31 + 7) as u8).collect();

            let mut reference = [0u8; 32];
            let mut hasher = Keccak::v256();
            hasher.update(&message);
            hasher.finalize(&mut reference);

            let digest = keccak256(&message).unwrap();
            assert_eq!(
                digest, reference,
                "digest mismatch at message length {}",
                len
            );
        }
    }

    /// A message that overflows the single rate block is a contract
    /// violation, not a truncated digest.
    #[test]
    fn oversized_message_is_a_contract_violation() {
        let message = vec![0u8; MAX_MESSAGE_BYTES + 1];
        match keccak256(&message) {
            Err(MinerError::ContractViolation(_)) => {}
            other => panic!("expected contract violation, got {:?}", other.map(hex::encode)),
        }
    }

    /// Same prefix and nonce must always produce the same digest.
    #[test]
    fn digest_is_deterministic() {
        let algo = Keccak256::new();
        let prefix = b"0xE8946EC499a839c72E60bA7d437E28cd73a3f487";
        let a = algo.hash(prefix, 42).unwrap();
        let b = algo.hash(prefix, 42).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, algo.hash(prefix, 43).unwrap(), "nonce must alter the digest");
    }

    /// The trait composes prefix and hex-encoded nonce exactly like the
    /// free function.
    #[test]
    fn trait_hash_matches_manual_message() {
        let algo = Keccak256::new();
        let prefix = b"addr";
        let via_trait = algo.hash(prefix, 0xdeadbeef).unwrap();
        let via_message = keccak256(b"addr00000000deadbeef").unwrap();
        assert_eq!(via_trait, via_message);
    }
}
