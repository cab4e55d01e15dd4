//! Transport trait abstraction for HTTP measurement traffic.
//!
//! This module defines the `HttpTransport` trait used for every request the
//! prober issues: discovery documents, latency samples, and payload
//! transfers. Implementations own connection reuse and timeouts; callers
//! only see bodies and status codes.

use async_trait::async_trait;
use bytes::Bytes;

/// Transport layer errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// TCP/TLS connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// URL could not be turned into a request
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Client could not be built from configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Body could not be read to completion
    #[error("Body read failed: {0}")]
    Body(String),

    /// Transport-specific error
    #[error("Transport error: {0}")]
    Other(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response from a status and body
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Async HTTP transport used by all measurements.
///
/// Every call is a single request; no retries happen at this layer. A
/// response with a non-2xx status is still `Ok` so callers decide what a
/// failed status means for them.
///
/// # Examples
///
/// ```no_run
/// use netsonde_transport::{HttpTransport, ReqwestTransport, TransportConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new(TransportConfig::default())?;
/// let response = transport.get("http://speedtest.example.net/speedtest/latency.txt").await?;
/// println!("status {} ({} bytes)", response.status, response.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET and read the whole body.
    ///
    /// # Errors
    /// Returns `TransportError` if the request cannot be completed
    async fn get(&self, url: &str) -> TransportResult<HttpResponse>;

    /// Issue a POST with `body` and read the whole response.
    ///
    /// # Errors
    /// Returns `TransportError` if the request cannot be completed
    async fn post(&self, url: &str, body: Bytes) -> TransportResult<HttpResponse>;

    /// Get transport statistics (optional).
    fn stats(&self) -> TransportStats {
        TransportStats::default()
    }
}

/// Transport statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Total body bytes sent
    pub bytes_sent: u64,
    /// Total body bytes received
    pub bytes_received: u64,
    /// Requests that produced a response
    pub requests: u64,
    /// Requests that failed before a response was read
    pub errors: u64,
}

impl TransportStats {
    /// Record a completed request
    pub fn record_request(&mut self, sent: usize, received: usize) {
        self.bytes_sent += sent as u64;
        self.bytes_received += received as u64;
        self.requests += 1;
    }

    /// Record a failed request
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Body bytes moved in either direction
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_sent + self.bytes_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "ok").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(404, "missing").is_success());
        assert!(!HttpResponse::new(503, "").is_success());
    }

    #[test]
    fn test_response_text_lossy() {
        let response = HttpResponse::new(200, vec![b'o', b'k', 0xFF]);
        assert_eq!(response.len(), 3);
        assert!(response.text().starts_with("ok"));
    }

    #[test]
    fn test_transport_stats() {
        let mut stats = TransportStats::default();
        assert_eq!(stats.requests, 0);

        stats.record_request(10, 200);
        stats.record_request(0, 50);
        assert_eq!(stats.bytes_sent, 10);
        assert_eq!(stats.bytes_received, 250);
        assert_eq!(stats.requests, 2);

        stats.record_error();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.total_bytes(), 260);
    }
}
