//! Configuration system for the netsonde CLI.

use netsonde_discovery::DirectoryUrls;
use netsonde_discovery::directory::{DEFAULT_CONFIG_URL, DEFAULT_SERVERS_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// netsonde configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Discovery configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Latency probe configuration
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Round-trip monitoring configuration
    #[serde(default)]
    pub ping: PingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Client configuration document URL
    #[serde(default = "default_config_url")]
    pub config_url: String,
    /// Server list document URL
    #[serde(default = "default_servers_url")]
    pub servers_url: String,
    /// Closest candidates probed per selection
    #[serde(default = "default_shortlist_size")]
    pub shortlist_size: usize,
}

/// Latency probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Samples per candidate
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Round-trip monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingConfig {
    /// Targets as host:port
    #[serde(default)]
    pub targets: Vec<String>,
    /// Connect attempts per target
    #[serde(default = "default_ping_attempts")]
    pub attempts: usize,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path (`~` expands to the home directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

// Default values

fn default_config_url() -> String {
    DEFAULT_CONFIG_URL.to_string()
}

fn default_servers_url() -> String {
    DEFAULT_SERVERS_URL.to_string()
}

fn default_shortlist_size() -> usize {
    netsonde_discovery::DEFAULT_SHORTLIST_SIZE
}

fn default_sample_count() -> usize {
    netsonde_core::DEFAULT_SAMPLE_COUNT
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ping_attempts() -> usize {
    netsonde_core::rtt::DEFAULT_ATTEMPTS
}

fn default_connect_timeout_secs() -> u64 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            config_url: default_config_url(),
            servers_url: default_servers_url(),
            shortlist_size: default_shortlist_size(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            attempts: default_ping_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("netsonde/config.toml")
    }

    /// Load config from default path, or create default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if reading or creating the config fails.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            let config = Self::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Discovery document locations
    #[must_use]
    pub fn directory_urls(&self) -> DirectoryUrls {
        DirectoryUrls {
            config_url: self.discovery.config_url.clone(),
            servers_url: self.discovery.servers_url.clone(),
        }
    }

    /// Per-request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }

    /// Round-trip connect timeout
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ping.connect_timeout_secs)
    }

    /// Log file with `~` expanded
    #[must_use]
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(expand_tilde)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_http_url(&self.discovery.config_url, "Discovery config_url")?;
        validate_http_url(&self.discovery.servers_url, "Discovery servers_url")?;

        if self.discovery.shortlist_size == 0 || self.discovery.shortlist_size > 50 {
            anyhow::bail!("Short-list size must be between 1 and 50");
        }

        if self.probe.sample_count < netsonde_core::MIN_SUCCESSFUL_SAMPLES
            || self.probe.sample_count > 50
        {
            anyhow::bail!(
                "Sample count must be between {} and 50",
                netsonde_core::MIN_SUCCESSFUL_SAMPLES
            );
        }

        if self.probe.timeout_secs == 0 || self.probe.timeout_secs > 300 {
            anyhow::bail!("Probe timeout must be between 1 and 300 seconds");
        }

        if self.ping.attempts == 0 || self.ping.attempts > 100 {
            anyhow::bail!("Ping attempts must be between 1 and 100");
        }

        if self.ping.connect_timeout_secs == 0 || self.ping.connect_timeout_secs > 60 {
            anyhow::bail!("Ping connect timeout must be between 1 and 60 seconds");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        for target in &self.ping.targets {
            validate_host_port(target, "Ping target")?;
        }

        Ok(())
    }
}

/// Expand a leading `~` to the home directory
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

fn validate_http_url(value: &str, name: &str) -> anyhow::Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} '{}' is not a valid URL: {}", name, value, e))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} '{}' must use http or https", name, value);
    }

    Ok(())
}

/// Validate host:port format
pub fn validate_host_port(addr: &str, name: &str) -> anyhow::Result<()> {
    let Some((host, port_str)) = addr.rsplit_once(':') else {
        anyhow::bail!(
            "{} '{}' missing port (expected format: host:port)",
            name,
            addr
        );
    };

    let port: u16 = port_str
        .parse()
        .map_err(|_| anyhow::anyhow!("{} '{}' has invalid port: {}", name, addr, port_str))?;

    if port == 0 {
        anyhow::bail!("{} '{}' has invalid port: 0", name, addr);
    }

    if host.is_empty() {
        anyhow::bail!("{} '{}' has empty hostname", name, addr);
    }

    if host.contains('/') || host.contains('\\') || host.contains(char::is_whitespace) {
        anyhow::bail!("{} '{}' contains invalid characters", name, addr);
    }

    Ok(())
}
