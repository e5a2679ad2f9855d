// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Credit tier awarded to a qualifying candidate
///
/// The controller pays out two classes of work: full shares that satisfy
/// the primary difficulty window, and minor shares that only satisfy the
/// looser secondary window. Digests meeting neither tier are discarded
/// before they ever reach the network layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTier {
    /// Candidate falls inside the full difficulty window (full credit)
    Full,

    /// Candidate falls inside the minor window but outside the full window
    /// (partial credit, reported separately to the controller)
    Minor,
}

impl fmt::Display for ShareTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareTier::Full => write!(f, "full"),
            ShareTier::Minor => write!(f, "minor"),
        }
    }
}

impl FromStr for ShareTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ShareTier::Full),
            "minor" => Ok(ShareTier::Minor),
            _ => Err(format!("Unknown share tier: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_round_trips_through_display() {
        for tier in [ShareTier::Full, ShareTier::Minor] {
            let parsed: ShareTier = tier.to_string().parse().unwrap();
            assert_eq!(parsed, tier);
        }
    }

    #[test]
    fn unknown_tier_is_rejected() {
        assert!("gold".parse::<ShareTier>().is_err());
    }
}
