// src/network/mod.rs
//! Network communication components
//!
//! This module handles all interaction with the remote mining-pool
//! controller: polling for job parameter updates and submitting
//! qualifying shares.

/// Controller client implementation
///
/// Polls the controller for job snapshots on a fixed cadence and submits
/// full and minor shares with bounded retry.
pub mod controller;

// Re-export main components for cleaner imports
pub use controller::{ControllerClient, ControllerConfig, JobSnapshot, SubmissionQueue};
