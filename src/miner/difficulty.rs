// src/miner/difficulty.rs
//! Difficulty classification
//!
//! Digests are interpreted as 256-bit unsigned integers, which exceed
//! native fixed-width range, so all target arithmetic uses `BigUint`.
//! Each tier (full and minor) is an inclusive `[lower, upper]` window;
//! a digest qualifies for the tightest tier whose window contains it.

use crate::types::ShareTier;
use crate::utils::error::MinerError;
use num_bigint::BigUint;

/// Parses a difficulty target from its configuration string
///
/// Accepts decimal (`"5731203885580"`) or 0x-prefixed hex
/// (`"0x7a2aff56698420"`), the two forms the controller and the default
/// configuration use.
///
/// # Errors
/// `MinerError::NumericError` if the string is not a valid unsigned
/// integer in either form. Callers at startup treat this as fatal.
pub fn parse_target(s: &str) -> Result<BigUint, MinerError> {
    let trimmed = s.trim();
    let (digits, radix) = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex_digits) => (hex_digits, 16),
        None => (trimmed, 10),
    };

    if digits.is_empty() {
        return Err(MinerError::NumericError(format!(
            "Empty difficulty string: '{}'",
            s
        )));
    }

    BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(|| {
        MinerError::NumericError(format!("Invalid difficulty string: '{}'", s))
    })
}

/// Inclusive difficulty window `[lower, upper]`
///
/// Invariant: `lower <= upper`, enforced at construction and therefore
/// at every use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyWindow {
    lower: BigUint,
    upper: BigUint,
}

impl DifficultyWindow {
    /// Creates a window, rejecting inverted bounds
    pub fn new(lower: BigUint, upper: BigUint) -> Result<Self, MinerError> {
        if lower > upper {
            return Err(MinerError::NumericError(format!(
                "Difficulty window inverted: lower {} > upper {}",
                lower, upper
            )));
        }
        Ok(DifficultyWindow { lower, upper })
    }

    /// Parses a window from its bound strings
    pub fn parse(lower: &str, upper: &str) -> Result<Self, MinerError> {
        Self::new(parse_target(lower)?, parse_target(upper)?)
    }

    /// Inclusive membership test: both bounds accept exact ties
    pub fn contains(&self, value: &BigUint) -> bool {
        *value >= self.lower && *value <= self.upper
    }

    /// The window's lower bound
    pub fn lower(&self) -> &BigUint {
        &self.lower
    }

    /// The window's upper bound
    pub fn upper(&self) -> &BigUint {
        &self.upper
    }
}

/// Classifies digests against the full and minor difficulty tiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    full: DifficultyWindow,
    minor: DifficultyWindow,
}

impl Comparator {
    /// Creates a comparator from the two tier windows
    pub fn new(full: DifficultyWindow, minor: DifficultyWindow) -> Self {
        Comparator { full, minor }
    }

    /// Classifies a digest
    ///
    /// # Returns
    /// - `Some(ShareTier::Full)` - digest inside the full window
    /// - `Some(ShareTier::Minor)` - inside the minor window, outside full
    /// - `None` - outside both windows; the candidate is discarded
    pub fn classify(&self, digest: &[u8; 32]) -> Option<ShareTier> {
        self.classify_value(&BigUint::from_bytes_be(digest))
    }

    /// Classifies a digest already interpreted as an integer
    pub fn classify_value(&self, value: &BigUint) -> Option<ShareTier> {
        if self.full.contains(value) {
            Some(ShareTier::Full)
        } else if self.minor.contains(value) {
            Some(ShareTier::Minor)
        } else {
            None
        }
    }

    /// The full-tier window
    pub fn full(&self) -> &DifficultyWindow {
        &self.full
    }

    /// The minor-tier window
    pub fn minor(&self) -> &DifficultyWindow {
        &self.minor
    }
}
