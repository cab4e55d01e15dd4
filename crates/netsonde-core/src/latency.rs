//! Outlier-trimmed HTTP latency probing.
//!
//! A probe issues a fixed number of sequential GETs to a host's
//! `/speedtest/latency.txt`, drops the single slowest successful sample
//! (usually cold connection setup) and averages the rest.

use crate::error::{Error, Result};
use crate::types::ProbeResult;
use crate::{DEFAULT_SAMPLE_COUNT, LATENCY_PATH, MIN_SUCCESSFUL_SAMPLES};
use async_trait::async_trait;
use netsonde_transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Something that can measure a candidate's latency.
///
/// The server selector is written against this trait so selection can be
/// exercised without a network.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Measure `hostname`, failing with [`Error::ProbeUnreachable`] when it
    /// does not answer often enough.
    async fn probe(&self, hostname: &str) -> Result<ProbeResult>;
}

/// HTTP latency probe
pub struct LatencyProbe {
    transport: Arc<dyn HttpTransport>,
    sample_count: usize,
    cancel: CancellationToken,
}

impl LatencyProbe {
    /// Create a probe taking [`DEFAULT_SAMPLE_COUNT`] samples per host
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            sample_count: DEFAULT_SAMPLE_COUNT,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the number of samples per host (at least two)
    #[must_use]
    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count.max(MIN_SUCCESSFUL_SAMPLES);
        self
    }

    /// Stop probing between samples once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Samples taken per host
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Take one timed sample; `None` when the request or status failed.
    async fn sample(&self, url: &str) -> Option<Duration> {
        let start = Instant::now();
        match self.transport.get(url).await {
            Ok(response) if response.is_success() => Some(start.elapsed()),
            Ok(response) => {
                tracing::debug!("latency sample {} returned HTTP {}", url, response.status);
                None
            }
            Err(e) => {
                tracing::debug!("latency sample {} failed: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl Prober for LatencyProbe {
    async fn probe(&self, hostname: &str) -> Result<ProbeResult> {
        let url = format!("http://{hostname}{LATENCY_PATH}");
        let mut samples = Vec::with_capacity(self.sample_count);

        for _ in 0..self.sample_count {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if let Some(elapsed) = self.sample(&url).await {
                samples.push(elapsed);
            }
        }

        let mean = trimmed_mean(&samples).ok_or_else(|| Error::ProbeUnreachable {
            host: hostname.to_string(),
            successes: samples.len(),
            attempts: self.sample_count,
        })?;

        let latency_ms = mean.as_secs_f64() * 1_000.0;
        tracing::debug!(
            "{}: {:.2} ms over {}/{} samples",
            hostname,
            latency_ms,
            samples.len(),
            self.sample_count
        );

        Ok(ProbeResult::new(hostname, latency_ms))
    }
}

/// Mean of `samples` after discarding the single largest one.
///
/// Returns `None` for fewer than two samples, where nothing would remain
/// to average.
///
/// # Example
///
/// ```
/// use netsonde_core::trimmed_mean;
/// use std::time::Duration;
///
/// let ms = |v| Duration::from_millis(v);
/// let samples = [ms(10), ms(12), ms(300), ms(14), ms(12)];
/// assert_eq!(trimmed_mean(&samples), Some(ms(12)));
/// assert_eq!(trimmed_mean(&[ms(10)]), None);
/// ```
#[must_use]
pub fn trimmed_mean(samples: &[Duration]) -> Option<Duration> {
    if samples.len() < MIN_SUCCESSFUL_SAMPLES {
        return None;
    }

    let worst = samples.iter().max()?;
    let total: Duration = samples.iter().sum::<Duration>() - *worst;
    let kept = u32::try_from(samples.len() - 1).ok()?;

    Some(total / kept)
}
