//! Error types for netsonde measurements.
//!
//! The taxonomy separates a discovery outage from an empty short-list so
//! operators can tell "service down" apart from "no reachable server".
//!
//! # Propagation
//!
//! - [`Error::ProbeUnreachable`] is recovered locally by the server selector,
//!   which excludes the candidate and moves on.
//! - Every other variant propagates to the caller.

use thiserror::Error;

/// Measurement errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Discovery documents could not be fetched or parsed
    #[error("discovery unavailable: {0}")]
    DiscoveryUnavailable(String),

    /// Fewer than two latency samples succeeded for a host
    #[error("probe unreachable: {host} ({successes}/{attempts} samples succeeded)")]
    ProbeUnreachable {
        /// Probed host
        host: String,
        /// Samples that completed
        successes: usize,
        /// Samples attempted
        attempts: usize,
    },

    /// No short-listed candidate produced a successful probe
    #[error("no server found: none of {probed} short-listed candidates responded")]
    NoServerFound {
        /// Number of candidates that were probed
        probed: usize,
    },

    /// A payload transfer failed, aborting the measurement
    #[error("transfer failed for {resource}: {reason}")]
    TransferFailed {
        /// URL of the payload resource
        resource: String,
        /// Underlying failure
        reason: String,
    },

    /// Cancellation was requested between two network calls
    #[error("measurement cancelled")]
    Cancelled,
}

impl Error {
    /// Whether retrying the same operation later may succeed.
    ///
    /// `NoServerFound` is not transient: every candidate already had its
    /// fixed number of chances.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryUnavailable(_)
                | Self::ProbeUnreachable { .. }
                | Self::TransferFailed { .. }
        )
    }
}

/// Result type for measurement operations
pub type Result<T> = std::result::Result<T, Error>;
