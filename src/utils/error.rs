// src/utils/error.rs
use crate::miner::job::Candidate;
use serde_json;
use std::io;
use thiserror::Error;
use url;

/// Main error type for the mining application
///
/// This enum represents all possible error conditions that can occur
/// during mining operations. Variants fall into two groups: recoverable
/// conditions that the caller retries (protocol and transient device
/// failures) and fatal conditions that terminate the process (numeric,
/// configuration and contract errors).
#[derive(Error, Debug)]
pub enum MinerError {
    /// Errors in protocol handling or invalid controller payloads
    /// (retried at the next poll/submit cycle, never fatal)
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// Errors related to network connectivity
    #[error("Network connection error: {0}")]
    ConnectionError(String),

    /// Unparseable difficulty or nonce strings
    ///
    /// Fatal at startup: the miner cannot safely search without a target.
    #[error("Numeric error: {0}")]
    NumericError(String),

    /// Compute backend failures (stream restart is attempted first;
    /// a fully unavailable device is fatal)
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Malformed internal state, such as a permutation input block that
    /// does not fit the sponge rate. Signals a programming defect.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts crossbeam channel send errors for Candidates into MinerError
///
/// Used when failing to hand qualifying candidates to the controller
/// client's submission channel.
impl From<crossbeam_channel::SendError<Candidate>> for MinerError {
    fn from(e: crossbeam_channel::SendError<Candidate>) -> Self {
        MinerError::ChannelError(format!("Candidate send failed: {}", e))
    }
}

/// Converts rayon thread-pool construction failures into MinerError
///
/// The stream pool is the miner's device handle; failing to build it
/// means no compute device is available, which is fatal.
impl From<rayon::ThreadPoolBuildError> for MinerError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        MinerError::DeviceError(format!("Stream pool unavailable: {}", e))
    }
}

/// Converts async task join errors into MinerError
///
/// Used when background tasks fail unexpectedly, including the
/// submission bridge between the search loop and the controller client.
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}
