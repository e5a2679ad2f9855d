// src/miner/scheduler.rs
//! Nonce search scheduler
//!
//! Partitions the nonce space into disjoint, contiguous sub-ranges, one
//! per execution stream, and drives the streams concurrently on a rayon
//! pool. Nonce assignment is a pure function of the launch base and the
//! (stream, lane) coordinates, so coverage is exactly-once per launch and
//! independent of execution timing.

use crate::miner::algorithm::{Algorithm, keccak};
use crate::miner::job::{Candidate, MiningJob};
use crate::utils::error::MinerError;
use rayon::prelude::*;

/// Shape of one launch
///
/// Mirrors the device geometry: each stream evaluates
/// `blocks * block_width` candidates, with `streams` streams in flight
/// concurrently.
#[derive(Debug, Clone, Copy)]
pub struct LaunchGeometry {
    /// Concurrently executing streams per launch
    pub streams: usize,
    /// Blocks per stream
    pub blocks: u64,
    /// Lanes per block
    pub block_width: u64,
}

impl LaunchGeometry {
    /// Candidates evaluated by a single stream
    pub fn stream_width(&self) -> u64 {
        self.blocks * self.block_width
    }

    /// Candidates evaluated by a whole launch
    pub fn launch_width(&self) -> u64 {
        self.streams as u64 * self.stream_width()
    }

    /// The nonce assigned to a (stream, lane) coordinate
    ///
    /// Pure: `base + stream_index * stream_width + local_index`, wrapping
    /// around the end of the 64-bit nonce space. A base configured near
    /// `u64::MAX` continues the search at zero instead of panicking.
    pub fn nonce_at(&self, base: u64, stream_index: usize, local_index: u64) -> u64 {
        base.wrapping_add(stream_index as u64 * self.stream_width())
            .wrapping_add(local_index)
    }
}

/// Lifecycle of a stream slot within one launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// Range assigned, stream not yet running
    Pending,
    /// Stream executing its range
    Running,
    /// Range fully evaluated, candidates collected
    Harvested,
    /// Backend failure aborted this stream's in-flight work
    Failed,
}

/// An execution stream's assignment for one launch
///
/// Owned exclusively by the scheduler; slots never outlive the launch
/// that created them.
#[derive(Debug, Clone)]
pub struct StreamSlot {
    /// Stream index within the launch
    pub index: usize,
    /// First nonce of the slot's contiguous range
    pub start: u64,
    /// One past the last nonce of the range; numerically smaller than
    /// `start` when the range wraps the end of the nonce space
    pub end: u64,
    /// Current lifecycle state
    pub status: SlotStatus,
}

/// Outcome of one launch
#[derive(Debug)]
pub struct LaunchReport {
    /// Base nonce the launch started from
    pub base: u64,
    /// Base nonce the next launch will start from
    pub next_base: u64,
    /// Number of candidates actually evaluated (failed slots excluded)
    pub evaluated: u64,
    /// Final state of every stream slot
    pub slots: Vec<StreamSlot>,
    /// Qualifying candidates in discovery order
    pub candidates: Vec<Candidate>,
}

/// Coordinates nonce evaluation across execution streams
pub struct Scheduler {
    geometry: LaunchGeometry,
    /// Stream pool; doubles as the device handle required before the
    /// first launch
    pool: rayon::ThreadPool,
    base_nonce: u64,
}

impl Scheduler {
    /// Creates a scheduler bound to a compute device
    ///
    /// # Arguments
    /// * `geometry` - Launch shape (streams, blocks, lanes)
    /// * `device` - Device index chosen by the external selector; recorded
    ///   for diagnostics
    /// * `start_nonce` - Base the first launch starts from
    ///
    /// # Errors
    /// `MinerError::DeviceError` if the stream pool cannot be built: a
    /// device fully unavailable is fatal.
    pub fn new(geometry: LaunchGeometry, device: usize, start_nonce: u64) -> Result<Self, MinerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(geometry.streams)
            .thread_name(move |i| format!("stream-{}-{}", device, i))
            .build()?;

        log::info!(
            "Scheduler on device {}: {} streams x {} blocks x {} lanes per launch",
            device,
            geometry.streams,
            geometry.blocks,
            geometry.block_width
        );

        Ok(Scheduler {
            geometry,
            pool,
            base_nonce: start_nonce,
        })
    }

    /// The base nonce the next launch will start from
    pub fn base_nonce(&self) -> u64 {
        self.base_nonce
    }

    /// Resets the base nonce, used when a new job defines a new search space
    pub fn reset_base(&mut self, base: u64) {
        self.base_nonce = base;
    }

    /// The configured launch geometry
    pub fn geometry(&self) -> LaunchGeometry {
        self.geometry
    }

    /// Runs one launch against a stable job snapshot
    ///
    /// Evaluates the contiguous range `[base, base + launch_width)` split
    /// across the streams, classifies every digest against the job's
    /// difficulty windows and returns candidates meeting at least the
    /// minor tier, in discovery order. Advances the base nonce by the
    /// launch width so consecutive launches never overlap; the advance
    /// wraps modulo the 64-bit nonce space.
    ///
    /// A backend failure inside a stream aborts only that stream's
    /// remaining range; the other streams' results are still harvested.
    ///
    /// # Errors
    /// `MinerError::ContractViolation` if the job's message prefix cannot
    /// fit a rate block together with the encoded nonce.
    pub fn launch(
        &mut self,
        job: &MiningJob,
        algorithm: &(dyn Algorithm),
    ) -> Result<LaunchReport, MinerError> {
        let prefix = job.message_prefix();
        // validate the single-block contract once, not per candidate
        if prefix.len() + 16 > keccak::MAX_MESSAGE_BYTES {
            return Err(MinerError::ContractViolation(format!(
                "Job message prefix of {} bytes leaves no room for the nonce",
                prefix.len()
            )));
        }

        let base = self.base_nonce;
        let geometry = self.geometry;
        let stream_width = geometry.stream_width();

        let mut slots: Vec<StreamSlot> = (0..geometry.streams)
            .map(|index| {
                let start = geometry.nonce_at(base, index, 0);
                StreamSlot {
                    index,
                    start,
                    end: start.wrapping_add(stream_width),
                    status: SlotStatus::Pending,
                }
            })
            .collect();

        let comparator = &job.comparator;
        let prefix = prefix.as_slice();

        let harvested: Vec<Vec<Candidate>> = self.pool.install(|| {
            slots
                .par_iter_mut()
                .map(|slot| {
                    slot.status = SlotStatus::Running;
                    let mut found = Vec::new();

                    // count lanes rather than iterating start..end, so a
                    // range that wraps the nonce space still enumerates
                    for offset in 0..stream_width {
                        let nonce = slot.start.wrapping_add(offset);
                        match algorithm.hash(prefix, nonce) {
                            Ok(digest) => {
                                if let Some(tier) = comparator.classify(&digest) {
                                    found.push(Candidate { nonce, digest, tier });
                                }
                            }
                            Err(e) => {
                                log::error!(
                                    "Stream {} aborted at nonce {}: {}",
                                    slot.index,
                                    nonce,
                                    e
                                );
                                slot.status = SlotStatus::Failed;
                                return found;
                            }
                        }
                    }

                    slot.status = SlotStatus::Harvested;
                    found
                })
                .collect()
        });

        let evaluated = slots
            .iter()
            .filter(|s| s.status == SlotStatus::Harvested)
            .count() as u64
            * stream_width;
        let candidates: Vec<Candidate> = harvested.into_iter().flatten().collect();

        // the base always advances by the full launch width, including
        // failed slots; coverage of a failed range is best-effort. The
        // advance wraps at the end of the nonce space.
        self.base_nonce = base.wrapping_add(geometry.launch_width());

        Ok(LaunchReport {
            base,
            next_base: self.base_nonce,
            evaluated,
            slots,
            candidates,
        })
    }
}
