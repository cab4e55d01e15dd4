//! # netsonde Core
//!
//! Measurement primitives for netsonde.
//!
//! This crate provides:
//! - Outlier-trimmed HTTP latency probing ([`LatencyProbe`])
//! - Download and upload throughput measurement ([`ThroughputMeasurer`])
//! - Binary-prefix bit-rate formatting ([`BitRate`])
//! - TCP connect round-trip summaries ([`RoundTripProbe`])
//! - Plain metric records for an external time-series writer
//! - The error taxonomy shared by every measurement
//!
//! ## Measurement flow
//!
//! ```text
//! ┌──────────────────┐   hostname   ┌──────────────────┐
//! │  ServerSelector  │ ───────────▶ │   LatencyProbe   │  5 × GET latency.txt
//! │  (discovery)     │ ◀─────────── │                  │  drop worst, mean rest
//! └────────┬─────────┘  ProbeResult └──────────────────┘
//!          │ SelectedServer
//!          ▼
//! ┌──────────────────┐
//! │ThroughputMeasurer│  3 payloads, one client, bytes / elapsed
//! └────────┬─────────┘
//!          ▼
//!   ThroughputSample ──▶ MetricPoint ──▶ caller-supplied writer
//! ```
//!
//! The core never persists anything; records are handed to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod latency;
pub mod metrics;
pub mod rate;
pub mod rtt;
pub mod throughput;
pub mod types;

pub use error::{Error, Result};
pub use latency::{LatencyProbe, Prober, trimmed_mean};
pub use metrics::MetricPoint;
pub use rate::{BitRate, RateUnit};
pub use rtt::{RoundTripProbe, RttSummary};
pub use throughput::ThroughputMeasurer;
pub use types::{Direction, ProbeResult, SelectedServer, ThroughputSample};

/// Host-relative path probed for latency samples
pub const LATENCY_PATH: &str = "/speedtest/latency.txt";

/// Host-relative path payloads are uploaded to
pub const UPLOAD_PATH: &str = "/speedtest/upload.php";

/// Default number of latency samples per candidate
pub const DEFAULT_SAMPLE_COUNT: usize = 5;

/// Fewest successful samples a trimmed mean can be computed from
pub const MIN_SUCCESSFUL_SAMPLES: usize = 2;
