// src/network/controller.rs
//! Controller client implementation
//!
//! Maintains the miner's relationship with the remote work source: polls
//! the controller on a fixed cadence for the current job snapshot and
//! submits qualifying shares. Transport failures and malformed payloads
//! are never fatal; a failed poll skips the cycle and a failed submission
//! is retried with bounded backoff from a local queue.

use crate::miner::difficulty::{Comparator, DifficultyWindow};
use crate::miner::job::{Candidate, MiningJob};
use crate::utils::error::MinerError;
use arc_swap::ArcSwap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use url::Url;

/// Configuration for the controller connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller base URL (e.g., "http://trust-in.info:17395")
    pub url: String,
    /// Seconds between job polls
    pub poll_secs: u64,
}

/// One difficulty tier's bounds as the controller transmits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Inclusive upper bound, decimal or 0x-hex string
    pub upper: String,
    /// Inclusive lower bound, decimal or 0x-hex string
    pub lower: String,
}

/// The job parameters a poll returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Address the miner should credit
    pub address: String,
    /// Marker of the last mined block
    pub last_mined: String,
    /// Full-tier difficulty bounds
    pub difficulty: WindowSnapshot,
    /// Minor-tier difficulty bounds
    pub minor: WindowSnapshot,
}

impl JobSnapshot {
    /// Builds a [`MiningJob`] from this snapshot
    ///
    /// # Errors
    /// `MinerError::NumericError` on unparseable bounds. Coming from the
    /// network this is treated as a poll failure, not a fatal error.
    pub fn to_job(&self, start_nonce: u64) -> Result<MiningJob, MinerError> {
        let full = DifficultyWindow::parse(&self.difficulty.lower, &self.difficulty.upper)?;
        let minor = DifficultyWindow::parse(&self.minor.lower, &self.minor.upper)?;
        Ok(MiningJob {
            address: self.address.clone(),
            last_mined: self.last_mined.clone(),
            comparator: Comparator::new(full, minor),
            start_nonce,
        })
    }
}

/// Process-wide controller session state
///
/// Lifetime spans the orchestrator's run; re-initialized only when the
/// client reconnects after repeated failure.
#[derive(Debug)]
pub struct ControllerSession {
    /// Parsed controller endpoint
    pub endpoint: Url,
    /// When the last poll was attempted
    pub last_poll: Option<Instant>,
    /// Last snapshot the controller returned
    pub last_snapshot: Option<JobSnapshot>,
}

/// A share waiting for (re-)submission
#[derive(Debug, Clone)]
pub struct PendingShare {
    /// The candidate to submit
    pub candidate: Candidate,
    /// Submission attempts made so far
    pub attempts: u32,
    /// Earliest instant the next attempt may run
    pub next_attempt: Instant,
}

/// Local queue keeping shares alive across submission failures
///
/// Bounded in two directions: each entry has a retry budget, and the
/// queue has a maximum depth past which the oldest entries are dropped so
/// a dead controller cannot grow memory without limit.
#[derive(Debug)]
pub struct SubmissionQueue {
    entries: VecDeque<PendingShare>,
    max_depth: usize,
    retry_budget: u32,
    backoff_base: Duration,
}

impl SubmissionQueue {
    /// Creates a queue
    ///
    /// # Arguments
    /// * `max_depth` - Most shares held at once; the oldest is dropped on
    ///   overflow
    /// * `retry_budget` - Attempts per share before it is abandoned
    /// * `backoff_base` - First retry delay; doubles per failed attempt
    pub fn new(max_depth: usize, retry_budget: u32, backoff_base: Duration) -> Self {
        SubmissionQueue {
            entries: VecDeque::new(),
            max_depth,
            retry_budget,
            backoff_base,
        }
    }

    /// Enqueues a fresh share, immediately eligible for submission
    ///
    /// # Returns
    /// The oldest share if the queue was full and had to drop it.
    pub fn push(&mut self, candidate: Candidate, now: Instant) -> Option<PendingShare> {
        self.entries.push_back(PendingShare {
            candidate,
            attempts: 0,
            next_attempt: now,
        });
        if self.entries.len() > self.max_depth {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Pops the first share whose backoff has elapsed
    pub fn next_due(&mut self, now: Instant) -> Option<PendingShare> {
        let position = self.entries.iter().position(|e| e.next_attempt <= now)?;
        self.entries.remove(position)
    }

    /// Records a failed attempt, requeueing the share if budget remains
    ///
    /// # Returns
    /// `true` if the share was requeued, `false` if its budget is
    /// exhausted and it was abandoned.
    pub fn record_failure(&mut self, mut share: PendingShare, now: Instant) -> bool {
        share.attempts += 1;
        if share.attempts >= self.retry_budget {
            return false;
        }
        share.next_attempt = now + self.backoff_base * 2u32.pow(share.attempts - 1);
        self.entries.push_back(share);
        true
    }

    /// Number of shares waiting
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue holds no shares
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Client for the controller's poll/submit protocol
pub struct ControllerClient {
    config: ControllerConfig,
    client: Client,
    session: ControllerSession,
    /// Active job, swapped atomically when the controller changes it
    job: Arc<ArcSwap<MiningJob>>,
    /// Bumped on every job swap so the orchestrator detects changes
    generation: Arc<AtomicU64>,
    /// Candidates arriving from the orchestrator
    shares: crossbeam_channel::Receiver<Candidate>,
    queue: SubmissionQueue,
    shutdown: Arc<AtomicBool>,
}

impl ControllerClient {
    /// Share attempts before a submission is abandoned
    const RETRY_BUDGET: u32 = 5;
    /// Most unsubmitted shares held locally
    const MAX_QUEUE_DEPTH: usize = 256;
    /// First retry delay; doubles per failure
    const BACKOFF_BASE: Duration = Duration::from_secs(1);

    /// Creates a new ControllerClient
    ///
    /// # Arguments
    /// * `config` - Endpoint and poll cadence
    /// * `job` - Shared active-job cell (the client is its only writer)
    /// * `generation` - Shared swap counter
    /// * `shares` - Channel of candidates from the orchestrator
    /// * `shutdown` - Cooperative cancellation flag
    ///
    /// # Errors
    /// `MinerError::UrlError` if the configured endpoint does not parse.
    pub fn new(
        config: ControllerConfig,
        job: Arc<ArcSwap<MiningJob>>,
        generation: Arc<AtomicU64>,
        shares: crossbeam_channel::Receiver<Candidate>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, MinerError> {
        let endpoint = Url::parse(&config.url)?;
        Ok(ControllerClient {
            config,
            client: Client::new(),
            session: ControllerSession {
                endpoint,
                last_poll: None,
                last_snapshot: None,
            },
            job,
            generation,
            shares,
            queue: SubmissionQueue::new(
                Self::MAX_QUEUE_DEPTH,
                Self::RETRY_BUDGET,
                Self::BACKOFF_BASE,
            ),
            shutdown,
        })
    }

    /// Main event loop: poll timer plus submission drain
    ///
    /// Polling and submission run on this task; the search loop never
    /// waits on either. The share channel is drained without blocking so
    /// an in-flight candidate can never be lost between loop iterations.
    /// Returns once the shutdown flag is observed.
    pub async fn run(&mut self) -> Result<(), MinerError> {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.poll_secs));

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                log::info!(
                    "Controller client shutting down with {} share(s) unsubmitted",
                    self.queue.len()
                );
                return Ok(());
            }

            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_job().await {
                        log::warn!("Job poll failed, retrying next cycle: {}", e);
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            }

            while let Ok(candidate) = self.shares.try_recv() {
                if let Some(dropped) = self.queue.push(candidate, Instant::now()) {
                    log::warn!(
                        "Submission queue full; dropping oldest share (nonce {})",
                        dropped.candidate.nonce
                    );
                }
            }

            self.flush_queue().await;
        }
    }

    /// Fetches the current job snapshot and swaps it in if it changed
    ///
    /// Any transport error or unparseable payload is returned as an
    /// error; the caller logs it and retries at the next interval.
    pub async fn poll_job(&mut self) -> Result<(), MinerError> {
        self.session.last_poll = Some(Instant::now());
        let url = self.session.endpoint.join("job")?;
        let snapshot: JobSnapshot = self.client.get(url).send().await?.json().await?;
        self.install_snapshot(snapshot)
    }

    /// Installs a fetched snapshot, swapping the job only on a real change
    ///
    /// The first poll usually echoes the parameters the miner booted with;
    /// comparing against the live job keeps that a no-op, so the in-flight
    /// round is never discarded over a snapshot that changed nothing.
    fn install_snapshot(&mut self, snapshot: JobSnapshot) -> Result<(), MinerError> {
        if self.session.last_snapshot.as_ref() == Some(&snapshot) {
            return Ok(());
        }

        let current = self.job.load();
        let job = snapshot.to_job(current.start_nonce)?;
        if job.same_parameters(&current) {
            self.session.last_snapshot = Some(snapshot);
            return Ok(());
        }

        self.job.store(Arc::new(job));
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.session.last_snapshot = Some(snapshot);
        log::info!("Controller issued new job parameters");
        Ok(())
    }

    /// Submits every share whose backoff has elapsed
    ///
    /// Failures requeue the share with doubled backoff until its retry
    /// budget runs out, at which point it is abandoned with a warning.
    async fn flush_queue(&mut self) {
        let now = Instant::now();
        while let Some(share) = self.queue.next_due(now) {
            match self.submit(&share.candidate).await {
                Ok(()) => {
                    log::info!(
                        "Submitted {} share, nonce {:#018x}",
                        share.candidate.tier,
                        share.candidate.nonce
                    );
                }
                Err(e) => {
                    let retained = self.queue.record_failure(share, Instant::now());
                    if retained {
                        log::warn!("Share submission failed, will retry: {}", e);
                    } else {
                        log::warn!("Share submission abandoned after retries: {}", e);
                    }
                    // one failure this pass is enough; let backoff elapse
                    break;
                }
            }
        }
    }

    /// Sends one share to the controller
    async fn submit(&self, candidate: &Candidate) -> Result<(), MinerError> {
        let url = self.session.endpoint.join("submit")?;
        let body = submit_body(&self.job.load().address, candidate);
        let response = self.client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(MinerError::ProtocolError(format!(
                "Controller rejected submission: HTTP {}",
                response.status()
            )));
        }

        let ack: Value = response.json().await?;
        match ack.get("status").and_then(|s| s.as_str()) {
            Some("ok") => Ok(()),
            other => Err(MinerError::ProtocolError(format!(
                "Unexpected submission acknowledgement: {:?}",
                other
            ))),
        }
    }
}

/// Builds the structured submission request body
pub fn submit_body(address: &str, candidate: &Candidate) -> Value {
    json!({
        "address": address,
        "nonce": format!("{:#018x}", candidate.nonce),
        "digest": hex::encode(candidate.digest),
        "tier": candidate.tier.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShareTier;

    fn candidate(nonce: u64) -> Candidate {
        Candidate {
            nonce,
            digest: [0x11u8; 32],
            tier: ShareTier::Full,
        }
    }

    fn controller_snapshot() -> JobSnapshot {
        JobSnapshot {
            address: "0xE8946EC499a839c72E60bA7d437E28cd73a3f487".into(),
            last_mined: "0x422000000003B0019000000".into(),
            difficulty: WindowSnapshot {
                upper: "5731203885580".into(),
                lower: "0".into(),
            },
            minor: WindowSnapshot {
                upper: "0x7a2aff56698420".into(),
                lower: "0".into(),
            },
        }
    }

    fn client_fixture(
        initial: MiningJob,
    ) -> (ControllerClient, Arc<AtomicU64>, Arc<ArcSwap<MiningJob>>) {
        let job = Arc::new(ArcSwap::from_pointee(initial));
        let generation = Arc::new(AtomicU64::new(0));
        let (_share_tx, share_rx) = crossbeam_channel::unbounded();
        let client = ControllerClient::new(
            ControllerConfig {
                url: "http://127.0.0.1:1".into(),
                poll_secs: 30,
            },
            job.clone(),
            generation.clone(),
            share_rx,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        (client, generation, job)
    }

    /// Poll payloads parse straight from the controller's JSON shape.
    #[test]
    fn job_snapshot_parses_controller_payload() {
        let payload = r#"{
            "address": "0xE8946EC499a839c72E60bA7d437E28cd73a3f487",
            "last_mined": "0x422000000003B0019000000",
            "difficulty": {"upper": "5731203885580", "lower": "0"},
            "minor": {"upper": "0x7a2aff56698420", "lower": "0"}
        }"#;
        let snapshot: JobSnapshot = serde_json::from_str(payload).unwrap();
        let job = snapshot.to_job(7).unwrap();
        assert_eq!(job.start_nonce, 7);
        assert_eq!(job.address, "0xE8946EC499a839c72E60bA7d437E28cd73a3f487");
    }

    /// Unparseable bounds make the snapshot unusable, surfacing as a
    /// poll failure rather than a crash.
    #[test]
    fn snapshot_with_bad_bounds_is_a_numeric_error() {
        let snapshot = JobSnapshot {
            address: "0xabc".into(),
            last_mined: "0x0".into(),
            difficulty: WindowSnapshot {
                upper: "banana".into(),
                lower: "0".into(),
            },
            minor: WindowSnapshot {
                upper: "0".into(),
                lower: "0".into(),
            },
        };
        assert!(matches!(
            snapshot.to_job(0),
            Err(MinerError::NumericError(_))
        ));
    }

    /// The first poll commonly echoes the parameters the miner already
    /// started with; that must not swap the job, bump the generation or
    /// disturb the search position.
    #[test]
    fn unchanged_first_snapshot_does_not_bump_the_generation() {
        let snapshot = controller_snapshot();
        let initial = snapshot.to_job(42).unwrap();
        let (mut client, generation, job) = client_fixture(initial);

        client.install_snapshot(snapshot.clone()).unwrap();
        assert_eq!(
            generation.load(Ordering::SeqCst),
            0,
            "identical parameters must not trigger a swap"
        );
        assert_eq!(job.load().start_nonce, 42, "search progress must be untouched");

        // the recorded snapshot short-circuits the next poll as well
        client.install_snapshot(snapshot).unwrap();
        assert_eq!(generation.load(Ordering::SeqCst), 0);
    }

    /// A snapshot with changed parameters swaps the job and bumps the
    /// generation, carrying the current starting nonce forward.
    #[test]
    fn changed_snapshot_swaps_the_job() {
        let first = controller_snapshot();
        let initial = first.to_job(42).unwrap();
        let (mut client, generation, job) = client_fixture(initial);

        let mut second = first;
        second.last_mined = "0x422000000003B0019000001".into();
        client.install_snapshot(second.clone()).unwrap();

        assert_eq!(generation.load(Ordering::SeqCst), 1);
        let active = job.load();
        assert_eq!(active.last_mined, second.last_mined);
        assert_eq!(active.start_nonce, 42);
    }

    /// The submission body carries address, hex nonce, digest and tier.
    #[test]
    fn submit_body_has_required_fields() {
        let body = submit_body("0xabc", &candidate(0xdead));
        assert_eq!(body["address"], "0xabc");
        assert_eq!(body["nonce"], "0x000000000000dead");
        assert_eq!(body["digest"], hex::encode([0x11u8; 32]));
        assert_eq!(body["tier"], "full");
    }

    /// Two failures then a success submits the share exactly once: the
    /// queue pops it per due attempt and drops it permanently on success.
    #[test]
    fn share_retried_within_budget_submits_exactly_once() {
        let base = Instant::now();
        let mut queue = SubmissionQueue::new(16, 5, Duration::from_millis(10));
        queue.push(candidate(1), base);

        let mut submissions = 0;
        let mut failures_left = 2;
        let mut now = base;
        for _ in 0..10 {
            now += Duration::from_millis(100);
            if let Some(share) = queue.next_due(now) {
                if failures_left > 0 {
                    failures_left -= 1;
                    assert!(queue.record_failure(share, now), "budget must not be exhausted yet");
                } else {
                    submissions += 1;
                    // success: entry is simply not requeued
                }
            }
        }

        assert_eq!(submissions, 1, "share must be reported exactly once");
        assert!(queue.is_empty());
    }

    /// Exhausting the retry budget abandons the share.
    #[test]
    fn share_is_abandoned_after_retry_budget() {
        let base = Instant::now();
        let mut queue = SubmissionQueue::new(16, 3, Duration::from_millis(1));
        queue.push(candidate(2), base);

        let mut now = base;
        let mut abandoned = false;
        for _ in 0..5 {
            now += Duration::from_secs(1);
            if let Some(share) = queue.next_due(now) {
                if !queue.record_failure(share, now) {
                    abandoned = true;
                    break;
                }
            }
        }

        assert!(abandoned, "third failure must exhaust the budget");
        assert!(queue.is_empty());
    }

    /// Backoff keeps a failed share ineligible until its delay elapses.
    #[test]
    fn backoff_delays_the_next_attempt() {
        let base = Instant::now();
        let mut queue = SubmissionQueue::new(16, 5, Duration::from_secs(1));
        queue.push(candidate(3), base);

        let share = queue.next_due(base).unwrap();
        queue.record_failure(share, base);

        assert!(queue.next_due(base).is_none(), "share must wait out its backoff");
        assert!(
            queue.next_due(base + Duration::from_secs(2)).is_some(),
            "share becomes due after the backoff"
        );
    }

    /// Overflowing the queue drops the oldest entry to bound memory.
    #[test]
    fn queue_depth_is_bounded() {
        let base = Instant::now();
        let mut queue = SubmissionQueue::new(2, 5, Duration::from_secs(1));
        assert!(queue.push(candidate(1), base).is_none());
        assert!(queue.push(candidate(2), base).is_none());
        let dropped = queue.push(candidate(3), base).expect("oldest must drop");
        assert_eq!(dropped.candidate.nonce, 1);
        assert_eq!(queue.len(), 2);
    }
}
