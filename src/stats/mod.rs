// src/stats/mod.rs
//! Statistics collection and reporting module
//!
//! Tracks and periodically logs mining statistics: hashrate, per-tier
//! share counts and host utilization. The main component is
//! [`StatsReporter`], fed over crossbeam channels from the search loop.

/// Submodule containing the statistics reporter implementation
pub mod reporter;

// Re-export main components
pub use reporter::{HardwareStats, MiningStats, StatsReporter};
