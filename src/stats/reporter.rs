// src/stats/reporter.rs
use crate::types::ShareTier;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use sysinfo::System;

/// Statistics related to mining performance
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Total number of candidate digests evaluated
    pub hashes_total: u64,
    /// Full shares found so far
    pub full_shares: u64,
    /// Minor shares found so far
    pub minor_shares: u64,
    /// Average hashrate since start (hashes per second)
    pub avg_hashrate: f64,
}

/// Statistics related to hardware utilization
#[derive(Debug, Clone)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Memory currently used on the host (in bytes)
    pub memory_used: u64,
}

/// Collects and reports mining and hardware statistics
pub struct StatsReporter {
    /// Atomic counters for mining statistics
    stats: Arc<MiningStatsAtomic>,
    /// System information collector
    system: System,
    /// Interval at which stats are logged
    report_interval: Duration,
}

/// Atomic version of MiningStats for thread-safe updates
struct MiningStatsAtomic {
    hashes: AtomicU64,
    full: AtomicU64,
    minor: AtomicU64,
    start_time: Instant,
}

impl Clone for StatsReporter {
    fn clone(&self) -> Self {
        StatsReporter {
            stats: self.stats.clone(),
            system: System::new_all(),
            report_interval: self.report_interval,
        }
    }
}

impl StatsReporter {
    /// Creates a new StatsReporter with the specified reporting interval
    ///
    /// # Arguments
    /// * `report_interval` - How often to log statistics
    pub fn new(report_interval: Duration) -> Self {
        StatsReporter {
            stats: Arc::new(MiningStatsAtomic {
                hashes: AtomicU64::new(0),
                full: AtomicU64::new(0),
                minor: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
            system: System::new_all(),
            report_interval,
        }
    }

    /// Creates and returns a channel sender for found shares
    ///
    /// The reporter listens for tier events on a background thread and
    /// counts them per tier.
    pub fn share_sender(&self) -> Sender<ShareTier> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.start_share_listener(rx);
        tx
    }

    /// Creates and returns a channel sender for evaluated-hash counts
    pub fn hash_sender(&self) -> Sender<u64> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.start_hashrate_listener(rx);
        tx
    }

    /// Gets the current mining statistics
    ///
    /// # Returns
    /// A snapshot of the current mining statistics
    pub fn get_stats(&self) -> MiningStats {
        let total_seconds = self.stats.start_time.elapsed().as_secs_f64();
        let hashes = self.stats.hashes.load(Ordering::Relaxed);

        MiningStats {
            hashes_total: hashes,
            full_shares: self.stats.full.load(Ordering::Relaxed),
            minor_shares: self.stats.minor.load(Ordering::Relaxed),
            avg_hashrate: hashes as f64 / total_seconds.max(1.0),
        }
    }

    /// Gets the current hardware statistics
    ///
    /// Refreshes system information before returning the snapshot.
    pub fn get_hardware_stats(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();

        let cpus = self.system.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        HardwareStats {
            cpu_usage,
            memory_used: self.system.used_memory(),
        }
    }

    /// Starts the periodic reporting of statistics
    ///
    /// Spawns a background thread that logs stats at the configured
    /// interval.
    pub fn start_reporting(&self) {
        let mut reporter = self.clone();

        std::thread::spawn(move || {
            loop {
                std::thread::sleep(reporter.report_interval);
                let mining_stats = reporter.get_stats();
                let hw_stats = reporter.get_hardware_stats();

                log::info!(
                    "Hashrate: {:.2} H/s | Full/Minor shares: {}/{} | CPU: {:.1}%",
                    mining_stats.avg_hashrate,
                    mining_stats.full_shares,
                    mining_stats.minor_shares,
                    hw_stats.cpu_usage,
                );
            }
        });
    }

    /// Starts a listener for share tiers on a background thread
    fn start_share_listener(&self, receiver: Receiver<ShareTier>) {
        let stats = self.stats.clone();

        std::thread::spawn(move || {
            for tier in receiver {
                match tier {
                    ShareTier::Full => stats.full.fetch_add(1, Ordering::Relaxed),
                    ShareTier::Minor => stats.minor.fetch_add(1, Ordering::Relaxed),
                };
            }
        });
    }

    /// Starts a listener for hash counts on a background thread
    fn start_hashrate_listener(&self, receiver: Receiver<u64>) {
        let stats = self.stats.clone();

        std::thread::spawn(move || {
            for count in receiver {
                stats.hashes.fetch_add(count, Ordering::Relaxed);
            }
        });
    }
}
