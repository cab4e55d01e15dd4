//! Mock measurement servers and discovery documents
//!
//! Each [`MockServer`] is a local HTTP server answering the speedtest
//! endpoints (latency, download payloads, upload). A [`MockDirectory`]
//! serves the two discovery documents, listing any set of servers.

use mockito::{Mock, Server, ServerGuard};
use netsonde_core::{LATENCY_PATH, UPLOAD_PATH};
use netsonde_discovery::DirectoryUrls;
use netsonde_transport::{ReqwestTransport, TransportConfig};
use std::sync::Arc;
use std::time::Duration;

/// Download payload size served per resource
pub const PAYLOAD_SIZE: usize = 64 * 1024;

/// A measurement server with a given behaviour
pub struct MockServer {
    server: ServerGuard,
    _mocks: Vec<Mock>,
}

/// How a mock measurement server answers its latency endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Answers 200 everywhere
    Up,
    /// Answers 503 on the latency endpoint
    Failing,
}

impl MockServer {
    /// Start a server with `health`
    pub async fn start(health: Health) -> Self {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();

        let latency_status = match health {
            Health::Up => 200,
            Health::Failing => 503,
        };
        mocks.push(
            server
                .mock("GET", LATENCY_PATH)
                .with_status(latency_status)
                .with_body("test=test")
                .create_async()
                .await,
        );

        for resource in netsonde_core::throughput::DOWNLOAD_RESOURCES {
            mocks.push(
                server
                    .mock("GET", resource)
                    .with_status(200)
                    .with_body(vec![0xA5u8; PAYLOAD_SIZE])
                    .create_async()
                    .await,
            );
        }

        mocks.push(
            server
                .mock("POST", UPLOAD_PATH)
                .with_status(200)
                .with_body("size=0")
                .create_async()
                .await,
        );

        Self {
            server,
            _mocks: mocks,
        }
    }

    /// `host:port` of this server
    pub fn host(&self) -> String {
        self.server.host_with_port()
    }

    /// Upload endpoint URL, as listed in the server directory
    pub fn upload_url(&self) -> String {
        format!("http://{}{}", self.host(), UPLOAD_PATH)
    }
}

/// A discovery service
pub struct MockDirectory {
    server: ServerGuard,
    _mocks: Vec<Mock>,
}

impl MockDirectory {
    /// Serve a config document placing the client at `origin`, and a server
    /// list with one `(url, lat, lon)` entry per tuple
    pub async fn start(origin: (&str, &str), servers: &[(String, String, String)]) -> Self {
        let mut server = Server::new_async().await;
        let config = server
            .mock("GET", "/speedtest-config.php")
            .with_status(200)
            .with_body(config_xml(origin.0, origin.1))
            .create_async()
            .await;
        let list = server
            .mock("GET", "/speedtest-servers.php")
            .with_status(200)
            .with_body(servers_xml(servers))
            .create_async()
            .await;

        Self {
            server,
            _mocks: vec![config, list],
        }
    }

    /// Serve the config document but fail the server list with `status`
    pub async fn broken(status: usize) -> Self {
        let mut server = Server::new_async().await;
        let config = server
            .mock("GET", "/speedtest-config.php")
            .with_status(200)
            .with_body(config_xml("0", "0"))
            .create_async()
            .await;
        let list = server
            .mock("GET", "/speedtest-servers.php")
            .with_status(status)
            .create_async()
            .await;

        Self {
            server,
            _mocks: vec![config, list],
        }
    }

    /// Document locations on this service
    pub fn urls(&self) -> DirectoryUrls {
        DirectoryUrls {
            config_url: format!("{}/speedtest-config.php", self.server.url()),
            servers_url: format!("{}/speedtest-servers.php", self.server.url()),
        }
    }
}

/// Client configuration document
pub fn config_xml(lat: &str, lon: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<settings>
  <client ip="198.51.100.7" lat="{lat}" lon="{lon}" isp="Test ISP" country="US"/>
  <times dl1="5000000" dl2="35000000" dl3="800000000"/>
</settings>"#
    )
}

/// Server list document
pub fn servers_xml(servers: &[(String, String, String)]) -> String {
    let mut xml =
        String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<settings>\n<servers>\n");
    for (i, (url, lat, lon)) in servers.iter().enumerate() {
        xml.push_str(&format!(
            "<server url=\"{url}\" lat=\"{lat}\" lon=\"{lon}\" name=\"Test {i}\" country=\"Nowhere\" sponsor=\"Test\" id=\"{i}\"/>\n"
        ));
    }
    xml.push_str("</servers>\n</settings>");
    xml
}

/// `(url, lat, lon)` entry with numeric coordinates
pub fn entry(url: impl Into<String>, lat: f64, lon: f64) -> (String, String, String) {
    (url.into(), lat.to_string(), lon.to_string())
}

/// A real HTTP transport with short timeouts
pub fn transport() -> Arc<ReqwestTransport> {
    Arc::new(
        ReqwestTransport::new(TransportConfig::default().with_timeout(Duration::from_secs(5)))
            .expect("build transport"),
    )
}

/// An address nothing listens on
pub async fn closed_host() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}
