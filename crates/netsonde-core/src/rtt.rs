//! TCP connect round-trip summaries for monitored targets.
//!
//! Each attempt times a TCP handshake to `host:port`. Raw ICMP needs
//! elevated privileges, a connect does not.

use crate::error::{Error, Result};
use crate::metrics::MetricPoint;
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;

/// Default connect attempts per target
pub const DEFAULT_ATTEMPTS: usize = 4;

/// Min/avg/max round trip to one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RttSummary {
    /// Target as configured (`host:port`)
    pub target: String,
    /// Fastest successful attempt (ms)
    pub min_ms: f64,
    /// Mean of successful attempts (ms)
    pub avg_ms: f64,
    /// Slowest successful attempt (ms)
    pub max_ms: f64,
    /// Attempts made
    pub attempts: usize,
    /// Attempts that connected
    pub successes: usize,
}

impl RttSummary {
    /// Summarize successful samples; `None` if there are none
    #[must_use]
    pub fn from_samples(target: &str, samples: &[Duration], attempts: usize) -> Option<Self> {
        let min = samples.iter().min()?;
        let max = samples.iter().max()?;
        let total: Duration = samples.iter().sum();
        let avg = total.as_secs_f64() / samples.len() as f64;

        Some(Self {
            target: target.to_string(),
            min_ms: min.as_secs_f64() * 1_000.0,
            avg_ms: avg * 1_000.0,
            max_ms: max.as_secs_f64() * 1_000.0,
            attempts,
            successes: samples.len(),
        })
    }

    /// `min_rtt`, `avg_rtt` and `max_rtt` records tagged with the host
    #[must_use]
    pub fn points(&self) -> Vec<MetricPoint> {
        [
            ("min_rtt", "min_rtt_ms", self.min_ms),
            ("avg_rtt", "avg_rtt_ms", self.avg_ms),
            ("max_rtt", "max_rtt_ms", self.max_ms),
        ]
        .into_iter()
        .map(|(measurement, field, value)| {
            MetricPoint::new(measurement)
                .tag("host", self.target.clone())
                .field(field, value)
        })
        .collect()
    }
}

/// TCP connect prober
#[derive(Debug, Clone)]
pub struct RoundTripProbe {
    attempts: usize,
    connect_timeout: Duration,
    cancel: CancellationToken,
}

impl RoundTripProbe {
    /// Create a prober making `attempts` connects, each bounded by `connect_timeout`
    #[must_use]
    pub fn new(attempts: usize, connect_timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            connect_timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between attempts once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Measure `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProbeUnreachable`] when no attempt connects and
    /// [`Error::Cancelled`] if cancelled between attempts.
    pub async fn summarize(&self, target: &str) -> Result<RttSummary> {
        let mut samples = Vec::with_capacity(self.attempts);

        for _ in 0..self.attempts {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let start = Instant::now();
            match timeout(self.connect_timeout, TcpStream::connect(target)).await {
                Ok(Ok(_stream)) => samples.push(start.elapsed()),
                Ok(Err(e)) => tracing::debug!("connect to {} failed: {}", target, e),
                Err(_) => tracing::debug!("connect to {} timed out", target),
            }
        }

        RttSummary::from_samples(target, &samples, self.attempts).ok_or_else(|| {
            Error::ProbeUnreachable {
                host: target.to_string(),
                successes: 0,
                attempts: self.attempts,
            }
        })
    }
}

impl Default for RoundTripProbe {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_summary_from_samples() {
        let ms = Duration::from_millis;
        let summary = RttSummary::from_samples("db:8086", &[ms(10), ms(30), ms(20)], 4).unwrap();

        assert!((summary.min_ms - 10.0).abs() < 1e-9);
        assert!((summary.avg_ms - 20.0).abs() < 1e-9);
        assert!((summary.max_ms - 30.0).abs() < 1e-9);
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.attempts, 4);

        assert!(RttSummary::from_samples("db:8086", &[], 4).is_none());
    }

    #[test]
    fn test_summary_points() {
        let ms = Duration::from_millis;
        let points = RttSummary::from_samples("gw:80", &[ms(1), ms(3)], 2)
            .unwrap()
            .points();

        let names: Vec<&str> = points.iter().map(|p| p.measurement.as_str()).collect();
        assert_eq!(names, vec!["min_rtt", "avg_rtt", "max_rtt"]);
        assert!(points.iter().all(|p| p.tags["host"] == "gw:80"));
        assert!((points[1].fields["avg_rtt_ms"] - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_summarize_listening_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();

        let summary = RoundTripProbe::new(3, Duration::from_secs(2))
            .summarize(&target)
            .await
            .unwrap();

        assert_eq!(summary.successes, 3);
        assert!(summary.min_ms <= summary.avg_ms);
        assert!(summary.avg_ms <= summary.max_ms);
    }

    #[tokio::test]
    async fn test_summarize_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = RoundTripProbe::new(2, Duration::from_secs(2))
            .summarize(&target)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProbeUnreachable { successes: 0, attempts: 2, .. }));
    }
}
