// src/main.rs
use arc_swap::ArcSwap;
use clap::Parser;
use crossbeam_channel::unbounded;
use mminer_rs::miner::scheduler::LaunchGeometry;
use mminer_rs::utils::logging::init_bench_logging;
use mminer_rs::{self, *};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Main entry point for the miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Starts the mining operation with given configuration options
///
/// # Arguments
/// * `opts` - Command line options for mining operation
///
/// # Operations
/// 1. Initializes logging and loads configuration
/// 2. Validates difficulty parameters (fatal on numeric errors)
/// 3. Sets up statistics reporting and the stream scheduler
/// 4. Spawns the mining loop and runs the controller client until
///    shutdown
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();
    log::info!("mminer-rs v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if opts.config.exists() {
        config::load(&opts.config)?
    } else {
        log::info!(
            "No config file at {}; using built-in defaults",
            opts.config.display()
        );
        Config::default()
    };

    // Apply CLI overrides
    if let Some(device) = opts.device {
        config.device = device;
    }
    if let Some(streams) = opts.streams {
        config.streams = streams;
    }
    if opts.test {
        config.test = true;
        config.use_controller = false;
    }

    // Unparseable difficulty strings are fatal here, before any launch
    let job = MiningJob::from_config(&config)?;

    // Communication channel: orchestrator -> controller client
    let (share_sender, share_receiver) = unbounded();

    // Statistics reporting
    let reporter = stats::StatsReporter::new(Duration::from_secs(60));
    reporter.start_reporting();

    // Mining setup
    let geometry = LaunchGeometry {
        streams: config.streams,
        blocks: config.blocks,
        block_width: config.block_width,
    };
    let scheduler = Scheduler::new(geometry, config.device, job.start_nonce)?;

    let job_swap = Arc::new(ArcSwap::from_pointee(job));
    let generation = Arc::new(AtomicU64::new(0));
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut orchestrator = Orchestrator::new(
        scheduler,
        job_swap.clone(),
        generation.clone(),
        share_sender,
        shutdown.clone(),
    )
    .with_stats(reporter.hash_sender(), reporter.share_sender());

    let miner_thread = std::thread::spawn(move || orchestrator.run());

    // Runtime setup
    let rt = Runtime::new()?;
    let io_result = rt.block_on(async {
        if config.use_controller && !config.test {
            let controller_cfg = ControllerConfig {
                url: config.controller.clone(),
                poll_secs: config.poll_secs,
            };
            let mut client = ControllerClient::new(
                controller_cfg,
                job_swap,
                generation,
                share_receiver,
                shutdown.clone(),
            )?;
            tokio::select! {
                res = client.run() => res,
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Shutdown requested");
                    shutdown.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }
        } else {
            log::info!("Test mode: shares are logged locally, not submitted");
            let local_shutdown = shutdown.clone();
            tokio::select! {
                _ = tokio::task::spawn_blocking(move || {
                    drain_shares_locally(share_receiver, local_shutdown)
                }) => Ok(()),
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Shutdown requested");
                    shutdown.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
    });

    shutdown.store(true, Ordering::SeqCst);
    match miner_thread.join() {
        Ok(mining_result) => mining_result?,
        Err(_) => return Err(MinerError::TaskError("Mining thread panicked".into())),
    }
    io_result
}

/// Test-mode share sink: logs each found share instead of submitting it
fn drain_shares_locally(
    receiver: crossbeam_channel::Receiver<Candidate>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match receiver.recv_timeout(Duration::from_millis(500)) {
            Ok(candidate) => log::info!(
                "{} share: nonce {:#018x} digest {}",
                candidate.tier,
                candidate.nonce,
                hex::encode(candidate.digest)
            ),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Runs the permutation throughput benchmark
///
/// # Arguments
/// * `opts` - Benchmark configuration options
///
/// # Operations
/// 1. Initializes benchmark-specific logging
/// 2. Spawns worker threads hashing over a stock prefix
/// 3. Collects and reports performance statistics
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let reporter = stats::StatsReporter::new(Duration::from_secs(5));
    let hash_sender = reporter.hash_sender();

    log::info!(
        "Starting Keccak-256 benchmark for {} seconds on {} threads",
        opts.duration,
        opts.threads
    );

    let prefix = Config::default().address.into_bytes();
    let duration = opts.duration;
    let start_time = Instant::now();
    let handles: Vec<_> = (0..opts.threads)
        .map(|thread_index| {
            let sender = hash_sender.clone();
            let prefix = prefix.clone();
            std::thread::spawn(move || {
                let algo = Keccak256::new();
                let mut nonce = thread_index as u64;
                let mut last_log = Instant::now();
                let mut hashes = 0u64;

                while start_time.elapsed().as_secs() < duration {
                    let _ = algo.hash(&prefix, nonce);
                    nonce += 1;
                    hashes += 1;
                    let _ = sender.send(1);

                    // Log progress every second
                    if last_log.elapsed().as_secs() >= 1 {
                        log::debug!(
                            "Thread {:?}: {:.1} H/s",
                            std::thread::current().id(),
                            hashes as f64 / last_log.elapsed().as_secs_f64()
                        );
                        hashes = 0;
                        last_log = Instant::now();
                    }
                }
            })
        })
        .collect();

    // Wait for all threads to complete
    for handle in handles {
        handle
            .join()
            .map_err(|_| MinerError::TaskError("Benchmark thread panicked".into()))?;
    }

    // Report final results
    let stats = reporter.get_stats();
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", stats.hashes_total);
    log::info!("Average hashrate: {:.2} H/s", stats.avg_hashrate);
    log::logger().flush(); // Ensure final results appear

    Ok(())
}

/// Generates configuration template file
///
/// # Arguments
/// * `opts` - Configuration generation options
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let template = config::generate_template();
    std::fs::write(opts.output, template)?;
    Ok(())
}
