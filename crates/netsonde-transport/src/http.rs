//! `reqwest`-backed transport.
//!
//! One `reqwest::Client` is shared for the lifetime of the transport, so
//! consecutive requests to the same host reuse a pooled connection.

use crate::transport::{
    HttpResponse, HttpTransport, TransportError, TransportResult, TransportStats,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("netsonde/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Set the request timeout, keeping connect timeout at most as long
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }
}

/// HTTP transport over a pooled `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    stats: Mutex<TransportStats>,
}

impl ReqwestTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidConfig` if the client cannot be built.
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            stats: Mutex::new(TransportStats::default()),
        })
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        sent: usize,
    ) -> TransportResult<HttpResponse> {
        let result = async {
            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(HttpResponse { status, body })
        }
        .await;

        match &result {
            Ok(response) => self.lock_stats().record_request(sent, response.len()),
            Err(e) => {
                tracing::trace!("request failed: {}", e);
                self.lock_stats().record_error();
            }
        }

        result
    }

    // Counters stay usable even if a holder panicked
    fn lock_stats(&self) -> MutexGuard<'_, TransportStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> TransportResult<HttpResponse> {
        self.execute(self.client.get(url), 0).await
    }

    async fn post(&self, url: &str, body: Bytes) -> TransportResult<HttpResponse> {
        let sent = body.len();
        self.execute(self.client.post(url).body(body), sent).await
    }

    fn stats(&self) -> TransportStats {
        *self.lock_stats()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::ConnectionFailed(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
