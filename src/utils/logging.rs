// src/utils/logging.rs
//! Logging configuration and utilities
//!
//! Handles logging setup for the miner, including standard and
//! benchmark-specific configurations with a shared custom format.
//! Uses `env_logger` under the hood.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes the logging subsystem with sensible defaults
///
/// # Configuration
/// - Logs to stdout
/// - Default log level: Info
/// - Timestamp, level, module and line in every record
/// - Respects `RUST_LOG` environment variable if set
pub fn init_logging() {
    common_log_config().filter(None, LevelFilter::Info).init();
}

/// Configures benchmark-specific logging
///
/// Same formatting as standard logging but defaults to Debug level so
/// per-thread throughput lines are visible without extra flags.
pub fn init_bench_logging() {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.parse_env("RUST_LOG");
    }

    builder.init();
}

/// Creates and configures a base logger builder with common settings
///
/// # Returns
/// Partially configured `env_logger::Builder` instance
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
