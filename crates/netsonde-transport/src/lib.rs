//! # netsonde Transport
//!
//! HTTP transport layer for netsonde.
//!
//! This crate provides:
//! - The [`HttpTransport`] trait every measurement goes through
//! - A pooled `reqwest` implementation with per-request timeouts
//! - Transfer statistics shared by all callers of a transport
//!
//! Measurements never talk to the network directly, so the latency and
//! throughput logic can be driven by scripted transports in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;
pub mod transport;

pub use http::{ReqwestTransport, TransportConfig};
pub use transport::{HttpResponse, HttpTransport, TransportError, TransportResult, TransportStats};
