//! Measurement records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed-mean latency of one probed candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Probed host (`host[:port]`)
    pub hostname: String,
    /// Outlier-trimmed mean round-trip time in milliseconds
    pub latency_ms: f64,
}

impl ProbeResult {
    /// Create a new probe result
    #[must_use]
    pub fn new(hostname: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            hostname: hostname.into(),
            latency_ms,
        }
    }
}

/// The server a selection run settled on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedServer {
    /// Server host (`host[:port]`)
    pub hostname: String,
    /// Latency measured during selection, in milliseconds
    pub latency_ms: f64,
}

impl SelectedServer {
    /// Create a selected server record
    #[must_use]
    pub fn new(hostname: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            hostname: hostname.into(),
            latency_ms,
        }
    }

    /// Base URL for plain HTTP requests against this server
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.hostname)
    }

    /// Host with any `:port` suffix removed
    #[must_use]
    pub fn host_without_port(&self) -> &str {
        strip_port(&self.hostname)
    }
}

impl From<ProbeResult> for SelectedServer {
    fn from(result: ProbeResult) -> Self {
        Self {
            hostname: result.hostname,
            latency_ms: result.latency_ms,
        }
    }
}

impl fmt::Display for SelectedServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} ms)", self.hostname, self.latency_ms)
    }
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Server to client
    Download,
    /// Client to server
    Upload,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// One throughput measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSample {
    /// Transfer direction
    pub direction: Direction,
    /// Rate in binary megabits per second (`bps / 1024²`)
    pub megabits_per_second: f64,
    /// Server host, without port
    pub server_host: String,
    /// Total payload bytes moved
    pub bytes: u64,
    /// Total wall time in milliseconds
    pub elapsed_ms: f64,
}

impl ThroughputSample {
    /// Human-readable rate for this sample
    #[must_use]
    pub fn rate(&self) -> crate::BitRate {
        crate::BitRate::from_bits_per_second(self.megabits_per_second * 1024.0 * 1024.0)
    }
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // Bracketed IPv6 literal
        return match rest.find(']') {
            Some(end) => &host[..end + 2],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
