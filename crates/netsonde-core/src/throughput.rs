//! Download and upload throughput measurement.
//!
//! Each measurement moves a fixed set of three payloads sequentially over a
//! single transport, then divides total bytes by total wall time. A failure
//! on any payload aborts the whole measurement; partial results are never
//! averaged.

use crate::error::{Error, Result};
use crate::rate::{BitRate, bits_per_second, megabits_per_second};
use crate::types::{Direction, SelectedServer, ThroughputSample};
use crate::UPLOAD_PATH;
use bytes::Bytes;
use netsonde_transport::{HttpResponse, HttpTransport, TransportResult};
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Payload resources fetched for a download measurement, smallest first
pub const DOWNLOAD_RESOURCES: [&str; 3] = [
    "/speedtest/random350x350.jpg",
    "/speedtest/random500x500.jpg",
    "/speedtest/random1500x1500.jpg",
];

/// Payload sizes POSTed for an upload measurement
pub const UPLOAD_SIZES: [usize; 3] = [256 * 1024, 512 * 1024, 1024 * 1024];

/// Throughput measurer bound to one transport
pub struct ThroughputMeasurer {
    transport: Arc<dyn HttpTransport>,
    cancel: CancellationToken,
}

impl ThroughputMeasurer {
    /// Create a measurer
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between payloads once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Measure download throughput from `server`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransferFailed`] if any payload fetch fails or
    /// answers with a non-2xx status, and [`Error::Cancelled`] if cancelled
    /// between fetches.
    pub async fn measure_download(&self, server: &SelectedServer) -> Result<ThroughputSample> {
        let base = server.base_url();
        let mut total_bytes = 0u64;
        let start = Instant::now();

        for resource in DOWNLOAD_RESOURCES {
            self.check_cancelled()?;
            let url = format!("{base}{resource}");
            let response = checked(&url, self.transport.get(&url).await)?;
            total_bytes += response.len() as u64;
        }

        Ok(self.sample(Direction::Download, server, total_bytes, start.elapsed()))
    }

    /// Measure upload throughput to `server`.
    ///
    /// Payloads are random bytes generated before the clock starts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransferFailed`] if any upload fails or answers with
    /// a non-2xx status, and [`Error::Cancelled`] if cancelled between
    /// uploads.
    pub async fn measure_upload(&self, server: &SelectedServer) -> Result<ThroughputSample> {
        let url = format!("{}{UPLOAD_PATH}", server.base_url());
        let payloads = random_payloads(&UPLOAD_SIZES);
        let mut total_bytes = 0u64;
        let start = Instant::now();

        for payload in payloads {
            self.check_cancelled()?;
            let size = payload.len() as u64;
            checked(&url, self.transport.post(&url, payload).await)?;
            total_bytes += size;
        }

        Ok(self.sample(Direction::Upload, server, total_bytes, start.elapsed()))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    fn sample(
        &self,
        direction: Direction,
        server: &SelectedServer,
        bytes: u64,
        elapsed: Duration,
    ) -> ThroughputSample {
        let bps = bits_per_second(bytes, elapsed);
        tracing::info!(
            "{} from {}: {} ({} bytes in {:?})",
            direction,
            server.hostname,
            BitRate::from_bits_per_second(bps),
            bytes,
            elapsed
        );

        ThroughputSample {
            direction,
            megabits_per_second: megabits_per_second(bps),
            server_host: server.host_without_port().to_string(),
            bytes,
            elapsed_ms: elapsed.as_secs_f64() * 1_000.0,
        }
    }
}

fn checked(url: &str, result: TransportResult<HttpResponse>) -> Result<HttpResponse> {
    match result {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => Err(Error::TransferFailed {
            resource: url.to_string(),
            reason: format!("HTTP {}", response.status),
        }),
        Err(e) => Err(Error::TransferFailed {
            resource: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn random_payloads(sizes: &[usize]) -> Vec<Bytes> {
    let mut rng = rand::thread_rng();
    sizes
        .iter()
        .map(|&size| {
            let mut buf = vec![0u8; size];
            rng.fill_bytes(&mut buf);
            Bytes::from(buf)
        })
        .collect()
}
