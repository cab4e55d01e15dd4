//! Directory documents: client coordinates and the candidate server list.
//!
//! The discovery service publishes two XML documents:
//!
//! ```text
//! <settings><client ip="203.0.113.9" lat="40.71" lon="-74.00" isp="..."/> ... </settings>
//! <settings><servers><server url="http://host/speedtest/upload.php" lat=".." lon=".."/> ... </servers></settings>
//! ```
//!
//! Anything that keeps either document from producing an origin or a list
//! of records surfaces as `DiscoveryUnavailable`. Individual malformed
//! `<server>` entries are not errors here; ranking skips them.

use crate::candidate::{CandidateRecord, Coordinates};
use async_trait::async_trait;
use netsonde_core::{Error, Result};
use netsonde_transport::HttpTransport;
use serde::Deserialize;
use std::sync::Arc;

/// Default client configuration document
pub const DEFAULT_CONFIG_URL: &str = "https://www.speedtest.net/speedtest-config.php";

/// Default server list document
pub const DEFAULT_SERVERS_URL: &str = "https://www.speedtest.net/speedtest-servers.php";

/// Everything a selection run needs from discovery
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    /// Measuring host position
    pub origin: Coordinates,
    /// Client IP as seen by the service
    pub client_ip: Option<String>,
    /// Client ISP as seen by the service
    pub isp: Option<String>,
    /// Raw candidate entries, in document order
    pub candidates: Vec<CandidateRecord>,
}

/// Source of directory data for a selection run
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch origin coordinates and candidate records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiscoveryUnavailable`] if either document cannot be
    /// fetched or parsed.
    async fn fetch(&self) -> Result<Directory>;
}

/// Locations of the two directory documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUrls {
    /// Client configuration document URL
    pub config_url: String,
    /// Server list document URL
    pub servers_url: String,
}

impl Default for DirectoryUrls {
    fn default() -> Self {
        Self {
            config_url: DEFAULT_CONFIG_URL.to_string(),
            servers_url: DEFAULT_SERVERS_URL.to_string(),
        }
    }
}

/// Directory fetched over HTTP from a speedtest-style discovery service
pub struct SpeedtestDirectory {
    transport: Arc<dyn HttpTransport>,
    urls: DirectoryUrls,
}

impl SpeedtestDirectory {
    /// Create a directory client
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, urls: DirectoryUrls) -> Self {
        Self { transport, urls }
    }

    async fn fetch_document(&self, url: &str) -> Result<String> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| Error::DiscoveryUnavailable(format!("{url}: {e}")))?;

        if !response.is_success() {
            return Err(Error::DiscoveryUnavailable(format!(
                "{url}: HTTP {}",
                response.status
            )));
        }

        Ok(response.text())
    }
}

#[async_trait]
impl DirectorySource for SpeedtestDirectory {
    async fn fetch(&self) -> Result<Directory> {
        let config = self.fetch_document(&self.urls.config_url).await?;
        let client = parse_client(&config)?;

        let servers = self.fetch_document(&self.urls.servers_url).await?;
        let candidates = parse_servers(&servers)?;

        tracing::info!(
            "client {} ({}) at ({}, {}), {} candidates listed",
            client.client_ip.as_deref().unwrap_or("unknown"),
            client.isp.as_deref().unwrap_or("unknown ISP"),
            client.origin.latitude,
            client.origin.longitude,
            candidates.len()
        );

        Ok(Directory {
            origin: client.origin,
            client_ip: client.client_ip,
            isp: client.isp,
            candidates,
        })
    }
}

/// Fixed directory, for callers that already know their candidates
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    directory: Directory,
}

impl StaticDirectory {
    /// Serve `candidates` relative to `origin`
    #[must_use]
    pub fn new(origin: Coordinates, candidates: Vec<CandidateRecord>) -> Self {
        Self {
            directory: Directory {
                origin,
                client_ip: None,
                isp: None,
                candidates,
            },
        }
    }
}

#[async_trait]
impl DirectorySource for StaticDirectory {
    async fn fetch(&self) -> Result<Directory> {
        Ok(self.directory.clone())
    }
}

// =============================================================================
// XML documents
// =============================================================================

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    client: Option<ClientElement>,
}

#[derive(Debug, Deserialize)]
struct ClientElement {
    #[serde(rename = "@ip")]
    ip: Option<String>,
    #[serde(rename = "@lat")]
    lat: Option<String>,
    #[serde(rename = "@lon")]
    lon: Option<String>,
    #[serde(rename = "@isp")]
    isp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServersDocument {
    servers: Option<ServerList>,
}

// Non-`<server>` children may sit between entries; `overlapped-lists`
// keeps collecting across them.
#[derive(Debug, Deserialize)]
struct ServerList {
    #[serde(rename = "server", default)]
    entries: Vec<ServerElement>,
}

#[derive(Debug, Deserialize)]
struct ServerElement {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@lat")]
    lat: Option<String>,
    #[serde(rename = "@lon")]
    lon: Option<String>,
}

/// Client section of the configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInfo {
    /// Client position
    pub origin: Coordinates,
    /// Client IP as seen by the service
    pub client_ip: Option<String>,
    /// Client ISP as seen by the service
    pub isp: Option<String>,
}

/// Parse the client configuration document.
///
/// # Errors
///
/// Returns [`Error::DiscoveryUnavailable`] if the XML is malformed, has no
/// `<client>` element, or the client coordinates do not parse.
pub fn parse_client(xml: &str) -> Result<ClientInfo> {
    let document: ConfigDocument = quick_xml::de::from_str(xml)
        .map_err(|e| Error::DiscoveryUnavailable(format!("invalid config XML: {e}")))?;

    let client = document.client.ok_or_else(|| {
        Error::DiscoveryUnavailable("config document has no <client> element".to_string())
    })?;

    let origin = match (client.lat.as_deref(), client.lon.as_deref()) {
        (Some(lat), Some(lon)) => Coordinates::parse(lat, lon),
        _ => None,
    }
    .ok_or_else(|| {
        Error::DiscoveryUnavailable("client coordinates missing or unparseable".to_string())
    })?;

    Ok(ClientInfo {
        origin,
        client_ip: client.ip,
        isp: client.isp,
    })
}

/// Parse the server list document into raw records, in document order.
///
/// # Errors
///
/// Returns [`Error::DiscoveryUnavailable`] if the XML is malformed or has no
/// `<servers>` element.
pub fn parse_servers(xml: &str) -> Result<Vec<CandidateRecord>> {
    let document: ServersDocument = quick_xml::de::from_str(xml)
        .map_err(|e| Error::DiscoveryUnavailable(format!("invalid server list XML: {e}")))?;

    let servers = document.servers.ok_or_else(|| {
        Error::DiscoveryUnavailable("server list has no <servers> element".to_string())
    })?;

    Ok(servers
        .entries
        .into_iter()
        .map(|entry| CandidateRecord {
            url: entry.url,
            lat: entry.lat,
            lon: entry.lon,
        })
        .collect())
}
