// src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mminer CLI - Keccak proof-of-work pool miner in Rust
#[derive(Parser, Debug)]
#[command(name = "mminer-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (start mining, run benchmarks, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start mining operation with specified options
    Start(StartOptions),

    /// Run permutation throughput benchmarks
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Compute device index (overrides config)
    #[arg(short, long)]
    pub device: Option<usize>,

    /// Concurrent streams per launch (overrides config)
    #[arg(short, long)]
    pub streams: Option<usize>,

    /// Mine against local parameters only, without a controller
    #[arg(short, long)]
    pub test: bool,
}

/// Options for running digest benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,
}
