// src/miner/orchestrator.rs
//! Mining loop orchestrator
//!
//! Composes the scheduler, difficulty classification and the controller
//! client's channels into the continuous cycle
//! `Launching -> Harvesting -> Reporting -> Launching`, with
//! `ShuttingDown` reachable from any boundary on cancellation.
//!
//! The orchestrator never reads the live job reference during a round: it
//! takes a stable snapshot at the launch boundary and compares the swap
//! generation afterwards. If the controller installed new parameters
//! while the round ran, the round's candidates were evaluated against a
//! target that is no longer current and are discarded unsubmitted.

use crate::miner::algorithm::Keccak256;
use crate::miner::job::{Candidate, MiningJob};
use crate::miner::scheduler::{LaunchReport, Scheduler, SlotStatus};
use crate::types::ShareTier;
use crate::utils::error::MinerError;
use arc_swap::ArcSwap;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// States of the mining loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerState {
    /// Not yet started
    Idle,
    /// Scheduler beginning a round from the current base nonce
    Launching,
    /// Collecting candidates from completing streams
    Harvesting,
    /// Handing qualifying candidates to the controller client
    Reporting,
    /// Terminal; reached from any state on cancellation
    ShuttingDown,
}

/// What a completed round amounted to
#[derive(Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Round completed under a stable job; this many candidates reported
    Reported(usize),
    /// Job parameters changed mid-round; old candidates discarded
    Discarded,
    /// Shutdown observed at a state boundary
    ShutDown,
}

/// Stable per-round view of the active job
///
/// Captured at the launch boundary so the whole round runs against one
/// set of parameters regardless of concurrent controller swaps.
pub struct RoundSnapshot {
    job: Arc<MiningJob>,
    generation: u64,
}

/// Drives the continuous mining cycle
pub struct Orchestrator {
    scheduler: Scheduler,
    algorithm: Keccak256,
    /// Active job; written only by the controller client's atomic swap
    job: Arc<ArcSwap<MiningJob>>,
    /// Bumped by the controller client on every swap
    generation: Arc<AtomicU64>,
    /// Qualifying candidates head to the controller client through here
    shares: Sender<Candidate>,
    /// Cooperative cancellation flag, observed at state boundaries
    shutdown: Arc<AtomicBool>,
    state: MinerState,
    /// Evaluated-nonce counts for the stats reporter
    hash_stats: Option<Sender<u64>>,
    /// Per-tier share counts for the stats reporter
    share_stats: Option<Sender<ShareTier>>,
}

impl Orchestrator {
    /// Creates an orchestrator over an initialized scheduler
    ///
    /// # Arguments
    /// * `scheduler` - Scheduler already bound to a device
    /// * `job` - Atomically swappable active job, shared with the
    ///   controller client
    /// * `generation` - Swap counter, shared with the controller client
    /// * `shares` - Channel delivering candidates to the submission side
    /// * `shutdown` - Cancellation flag shared with the entry point
    pub fn new(
        scheduler: Scheduler,
        job: Arc<ArcSwap<MiningJob>>,
        generation: Arc<AtomicU64>,
        shares: Sender<Candidate>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Orchestrator {
            scheduler,
            algorithm: Keccak256::new(),
            job,
            generation,
            shares,
            shutdown,
            state: MinerState::Idle,
            hash_stats: None,
            share_stats: None,
        }
    }

    /// Attaches stats reporter channels
    pub fn with_stats(mut self, hashes: Sender<u64>, shares: Sender<ShareTier>) -> Self {
        self.hash_stats = Some(hashes);
        self.share_stats = Some(shares);
        self
    }

    /// Current state of the loop
    pub fn state(&self) -> MinerState {
        self.state
    }

    /// Runs the mining cycle until cancellation
    ///
    /// # Errors
    /// Propagates fatal scheduler errors (device loss, contract
    /// violations). Protocol-side failures never reach this loop; the
    /// controller client absorbs them.
    pub fn run(&mut self) -> Result<(), MinerError> {
        log::info!("Mining loop starting at base nonce {}", self.scheduler.base_nonce());

        loop {
            let snapshot = match self.begin_round() {
                Some(s) => s,
                None => break,
            };
            let report = self.execute_round(&snapshot)?;
            match self.finish_round(&snapshot, report)? {
                RoundOutcome::ShutDown => break,
                RoundOutcome::Discarded => {
                    log::info!("Job parameters changed mid-round; round discarded");
                }
                RoundOutcome::Reported(count) if count > 0 => {
                    log::info!("Round reported {} share(s)", count);
                }
                RoundOutcome::Reported(_) => {}
            }
        }

        self.state = MinerState::ShuttingDown;
        log::info!("Mining loop shut down at base nonce {}", self.scheduler.base_nonce());
        Ok(())
    }

    /// Launch boundary: observes shutdown, then snapshots the active job
    ///
    /// Returns `None` when cancellation was requested, leaving the loop
    /// to enter `ShuttingDown`.
    pub fn begin_round(&mut self) -> Option<RoundSnapshot> {
        if self.shutdown.load(Ordering::Relaxed) {
            return None;
        }
        self.state = MinerState::Launching;
        Some(RoundSnapshot {
            job: self.job.load_full(),
            generation: self.generation.load(Ordering::SeqCst),
        })
    }

    /// Launching and harvesting: one full launch against the snapshot
    pub fn execute_round(&mut self, snapshot: &RoundSnapshot) -> Result<LaunchReport, MinerError> {
        let report = self.scheduler.launch(&snapshot.job, &self.algorithm)?;
        self.state = MinerState::Harvesting;

        for slot in report.slots.iter().filter(|s| s.status == SlotStatus::Failed) {
            log::warn!(
                "Stream {} failed during launch at base {}; its range is lost",
                slot.index,
                report.base
            );
        }
        if let Some(sender) = &self.hash_stats {
            let _ = sender.send(report.evaluated);
        }

        Ok(report)
    }

    /// Reporting boundary: submit or discard the round's candidates
    ///
    /// If the job generation moved while the round ran, every candidate
    /// was classified against stale bounds: none are submitted, and the
    /// scheduler restarts from the new job's starting nonce.
    pub fn finish_round(
        &mut self,
        snapshot: &RoundSnapshot,
        report: LaunchReport,
    ) -> Result<RoundOutcome, MinerError> {
        self.state = MinerState::Reporting;

        if self.generation.load(Ordering::SeqCst) != snapshot.generation {
            let fresh = self.job.load_full();
            self.scheduler.reset_base(fresh.start_nonce);
            return Ok(RoundOutcome::Discarded);
        }

        let count = report.candidates.len();
        for candidate in report.candidates {
            if let Some(sender) = &self.share_stats {
                let _ = sender.send(candidate.tier);
            }
            // a disconnected submission channel means the I/O side is
            // gone; that only happens at teardown
            if self.shares.send(candidate).is_err() {
                log::debug!("Submission channel closed; shutting down");
                return Ok(RoundOutcome::ShutDown);
            }
        }

        if self.shutdown.load(Ordering::Relaxed) {
            return Ok(RoundOutcome::ShutDown);
        }
        Ok(RoundOutcome::Reported(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::difficulty::{Comparator, DifficultyWindow};
    use crate::miner::scheduler::LaunchGeometry;
    use crossbeam_channel::unbounded;
    use num_bigint::BigUint;

    fn catch_all_job(start_nonce: u64) -> MiningJob {
        let max = BigUint::from_bytes_be(&[0xffu8; 32]);
        MiningJob {
            address: "0xabc".into(),
            last_mined: "0x0".into(),
            comparator: Comparator::new(
                DifficultyWindow::new(BigUint::ZERO, max.clone()).unwrap(),
                DifficultyWindow::new(BigUint::ZERO, max).unwrap(),
            ),
            start_nonce,
        }
    }

    fn orchestrator_fixture(
        start_nonce: u64,
    ) -> (
        Orchestrator,
        Arc<ArcSwap<MiningJob>>,
        Arc<AtomicU64>,
        crossbeam_channel::Receiver<Candidate>,
        Arc<AtomicBool>,
    ) {
        let geometry = LaunchGeometry {
            streams: 2,
            blocks: 2,
            block_width: 4,
        };
        let scheduler = Scheduler::new(geometry, 0, start_nonce).unwrap();
        let job = Arc::new(ArcSwap::from_pointee(catch_all_job(start_nonce)));
        let generation = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded();
        let orch = Orchestrator::new(
            scheduler,
            job.clone(),
            generation.clone(),
            tx,
            shutdown.clone(),
        );
        (orch, job, generation, rx, shutdown)
    }

    /// A stable round reports every harvested candidate.
    #[test]
    fn stable_round_reports_candidates() {
        let (mut orch, _job, _generation, rx, _shutdown) = orchestrator_fixture(50);

        let snapshot = orch.begin_round().expect("no shutdown requested");
        let report = orch.execute_round(&snapshot).unwrap();
        let outcome = orch.finish_round(&snapshot, report).unwrap();

        assert_eq!(outcome, RoundOutcome::Reported(16));
        assert_eq!(rx.len(), 16, "all 16 candidates must reach the channel");
    }

    /// A controller swap mid-round discards the whole round and restarts
    /// the search from the new job's starting nonce.
    #[test]
    fn job_change_mid_round_discards_candidates() {
        let (mut orch, job, generation, rx, _shutdown) = orchestrator_fixture(50);

        let snapshot = orch.begin_round().unwrap();
        let report = orch.execute_round(&snapshot).unwrap();

        // controller installs new parameters while the round was running
        job.store(Arc::new(catch_all_job(9000)));
        generation.fetch_add(1, Ordering::SeqCst);

        let outcome = orch.finish_round(&snapshot, report).unwrap();
        assert_eq!(outcome, RoundOutcome::Discarded);
        assert!(rx.is_empty(), "stale candidates must never be submitted");

        // the next round starts from the new search space
        let next = orch.begin_round().unwrap();
        let next_report = orch.execute_round(&next).unwrap();
        assert_eq!(next_report.base, 9000);
    }

    /// Cancellation at the launch boundary ends the loop without work.
    #[test]
    fn shutdown_is_observed_at_launch_boundary() {
        let (mut orch, _job, _generation, _rx, shutdown) = orchestrator_fixture(0);
        shutdown.store(true, Ordering::Relaxed);
        assert!(orch.begin_round().is_none());
    }

    /// run() terminates once shutdown is requested and lands in
    /// ShuttingDown.
    #[test]
    fn run_terminates_on_shutdown() {
        let (mut orch, _job, _generation, rx, shutdown) = orchestrator_fixture(0);

        let handle = std::thread::spawn(move || {
            orch.run().unwrap();
            orch.state()
        });
        // drain so the loop never blocks on an unbounded channel (it
        // cannot, but keep the receiver alive until shutdown)
        std::thread::sleep(std::time::Duration::from_millis(50));
        shutdown.store(true, Ordering::Relaxed);
        let state = handle.join().unwrap();
        assert_eq!(state, MinerState::ShuttingDown);
        drop(rx);
    }
}
