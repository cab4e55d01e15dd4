//! # netsonde Discovery
//!
//! Nearest-server discovery for netsonde.
//!
//! This crate provides:
//! - Directory documents (client coordinates and the server list, as XML)
//! - Planar distance ranking with stable ordered insertion
//! - Upload-URL host extraction
//! - Latency-driven server selection over a distance short-list
//!
//! ## Selection run
//!
//! 1. Fetch the origin coordinates and candidate directory
//! 2. Rank every coordinate-valid candidate by planar distance
//! 3. Short-list the closest K (default 10)
//! 4. Probe each short-listed host, excluding the unreachable ones
//! 5. Pick the lowest trimmed-mean latency, or fail with `NoServerFound`
//!
//! ## Example
//!
//! ```rust,no_run
//! use netsonde_core::LatencyProbe;
//! use netsonde_discovery::{DirectoryUrls, ServerSelector, SpeedtestDirectory};
//! use netsonde_transport::{ReqwestTransport, TransportConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(ReqwestTransport::new(TransportConfig::default())?);
//! let directory = SpeedtestDirectory::new(transport.clone(), DirectoryUrls::default());
//! let selector = ServerSelector::new(directory, LatencyProbe::new(transport));
//!
//! let server = selector.select_server().await?;
//! println!("selected {server}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod directory;
pub mod ranking;
pub mod selection;

pub use candidate::{Candidate, CandidateRecord, Coordinates, upload_host};
pub use directory::{
    ClientInfo, Directory, DirectorySource, DirectoryUrls, SpeedtestDirectory, StaticDirectory,
    parse_client, parse_servers,
};
pub use ranking::{DistanceRanker, RankedCandidate, rank, rank_candidates};
pub use selection::{DEFAULT_SHORTLIST_SIZE, Selection, ServerSelector, fastest};
