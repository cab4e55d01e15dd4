//! netsonde CLI
//!
//! Finds the nearest responsive speed-test server and measures latency,
//! download and upload throughput against it.

mod config;
mod progress;
mod report;

use anyhow::Context;
use clap::{Parser, Subcommand};
use netsonde_core::{
    Error as CoreError, LatencyProbe, Prober, RoundTripProbe, SelectedServer, ThroughputMeasurer,
};
use netsonde_discovery::{ServerSelector, SpeedtestDirectory};
use netsonde_transport::{HttpTransport, ReqwestTransport, TransportConfig};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use config::{Config, validate_host_port};
use progress::MeasurementProgress;
use report::{OutputFormat, Reporter};

/// netsonde - nearest server discovery and bandwidth measurement
#[derive(Parser)]
#[command(name = "netsonde")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Hide progress spinners
    #[arg(long)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover candidates and select the lowest-latency server
    Select,

    /// Measure the latency of a single server
    Latency {
        /// Server as host[:port]
        #[arg(required = true)]
        host: String,

        /// Samples to take
        #[arg(short = 'n', long)]
        samples: Option<usize>,
    },

    /// Measure download throughput
    Download {
        /// Use this server instead of running a selection
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Measure upload throughput
    Upload {
        /// Use this server instead of running a selection
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Select a server, then measure download and upload
    Speedtest {
        /// Use this server instead of running a selection
        #[arg(short, long)]
        server: Option<String>,

        /// Skip the upload measurement
        #[arg(long)]
        skip_upload: bool,
    },

    /// TCP round-trip times to fixed targets
    Ping {
        /// Targets as host:port (defaults to the configured targets)
        targets: Vec<String>,
    },
}

/// Exit status for retryable failures (`EX_TEMPFAIL`)
const EXIT_TEMPFAIL: u8 = 75;

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Map a failure to an exit status. Retryable network failures get
/// `EX_TEMPFAIL`, everything else 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Cancelled) => EXIT_INTERRUPTED,
        Some(e) if e.is_transient() => EXIT_TEMPFAIL,
        _ => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    // Validate configuration
    config.validate()?;

    init_logging(cli.verbose, &config)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current request");
            interrupt.cancel();
        }
    });

    let transport = ReqwestTransport::new(
        TransportConfig::default().with_timeout(config.request_timeout()),
    )?;

    let reporter = Reporter::new(cli.format);
    let app = App {
        transport: Arc::new(transport),
        show_progress: !cli.no_progress && reporter.is_interactive(),
        reporter,
        cancel,
        config,
    };

    match cli.command {
        Commands::Select => app.select().await?,
        Commands::Latency { host, samples } => app.latency(&host, samples).await?,
        Commands::Download { server } => {
            let server = app.resolve_server(server).await?;
            app.download(&server).await?;
        }
        Commands::Upload { server } => {
            let server = app.resolve_server(server).await?;
            app.upload(&server).await?;
        }
        Commands::Speedtest {
            server,
            skip_upload,
        } => {
            let server = app.resolve_server(server).await?;
            app.download(&server).await?;
            if !skip_upload {
                app.upload(&server).await?;
            }
        }
        Commands::Ping { targets } => app.ping(targets).await?,
    }

    let traffic = app.transport.stats();
    tracing::debug!(
        "{} requests, {} failed, {} bytes sent, {} bytes received",
        traffic.requests,
        traffic.errors,
        traffic.bytes_sent,
        traffic.bytes_received
    );
    app.reporter.traffic(&traffic)?;

    Ok(())
}

/// Log to stderr, or to the configured file without colors
fn init_logging(verbose: bool, config: &Config) -> anyhow::Result<()> {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.log_file() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Shared state for one command invocation
struct App {
    config: Config,
    transport: Arc<dyn HttpTransport>,
    cancel: CancellationToken,
    reporter: Reporter,
    show_progress: bool,
}

impl App {
    fn prober(&self, samples: Option<usize>) -> LatencyProbe {
        LatencyProbe::new(Arc::clone(&self.transport))
            .with_sample_count(samples.unwrap_or(self.config.probe.sample_count))
            .with_cancellation(self.cancel.clone())
    }

    fn selector(&self) -> ServerSelector<SpeedtestDirectory, LatencyProbe> {
        let directory =
            SpeedtestDirectory::new(Arc::clone(&self.transport), self.config.directory_urls());
        ServerSelector::new(directory, self.prober(None))
            .with_shortlist_size(self.config.discovery.shortlist_size)
            .with_cancellation(self.cancel.clone())
    }

    fn measurer(&self) -> ThroughputMeasurer {
        ThroughputMeasurer::new(Arc::clone(&self.transport)).with_cancellation(self.cancel.clone())
    }

    /// Run a full selection and print every probe
    async fn select(&self) -> anyhow::Result<()> {
        let progress = MeasurementProgress::start("Selecting server...", self.show_progress);
        match self.selector().select().await {
            Ok(selection) => {
                progress.finish_with_message(format!("Selected {}", selection.server));
                self.reporter.selection(&selection)
            }
            Err(e) => {
                progress.abandon();
                Err(e.into())
            }
        }
    }

    async fn latency(&self, host: &str, samples: Option<usize>) -> anyhow::Result<()> {
        let prober = self.prober(samples);
        let progress = MeasurementProgress::start(
            &format!("Probing {} ({} samples)...", host, prober.sample_count()),
            self.show_progress,
        );
        match prober.probe(host).await {
            Ok(result) => {
                progress.finish_with_message(format!("Probed {}", host));
                self.reporter.probe(&result)
            }
            Err(e) => {
                progress.abandon();
                Err(e.into())
            }
        }
    }

    /// Probe an explicitly named server, or select one
    async fn resolve_server(&self, server: Option<String>) -> anyhow::Result<SelectedServer> {
        match server {
            Some(host) => {
                tracing::info!("Using server {}", host);
                let result = self.prober(None).probe(&host).await?;
                Ok(SelectedServer::from(result))
            }
            None => {
                let progress =
                    MeasurementProgress::start("Selecting server...", self.show_progress);
                match self.selector().select_server().await {
                    Ok(server) => {
                        progress.finish_with_message(format!("Selected {}", server));
                        Ok(server)
                    }
                    Err(e) => {
                        progress.abandon();
                        Err(e.into())
                    }
                }
            }
        }
    }

    async fn download(&self, server: &SelectedServer) -> anyhow::Result<()> {
        let progress = MeasurementProgress::start(
            &format!("Downloading from {}...", server.hostname),
            self.show_progress,
        );
        match self.measurer().measure_download(server).await {
            Ok(sample) => {
                progress.finish_with_message(format!("Download: {}", sample.rate()));
                self.reporter.throughput(&sample)
            }
            Err(e) => {
                progress.abandon();
                Err(e.into())
            }
        }
    }

    async fn upload(&self, server: &SelectedServer) -> anyhow::Result<()> {
        let progress = MeasurementProgress::start(
            &format!("Uploading to {}...", server.hostname),
            self.show_progress,
        );
        match self.measurer().measure_upload(server).await {
            Ok(sample) => {
                progress.finish_with_message(format!("Upload: {}", sample.rate()));
                self.reporter.throughput(&sample)
            }
            Err(e) => {
                progress.abandon();
                Err(e.into())
            }
        }
    }

    /// Summarize each target; unreachable targets are logged and skipped
    async fn ping(&self, targets: Vec<String>) -> anyhow::Result<()> {
        let targets = if targets.is_empty() {
            self.config.ping.targets.clone()
        } else {
            targets
        };
        if targets.is_empty() {
            anyhow::bail!("No ping targets given and none configured under [ping]");
        }
        for target in &targets {
            validate_host_port(target, "Ping target")?;
        }

        let probe = RoundTripProbe::new(self.config.ping.attempts, self.config.connect_timeout())
            .with_cancellation(self.cancel.clone());

        let mut reached = 0;
        for target in &targets {
            match probe.summarize(target).await {
                Ok(summary) => {
                    reached += 1;
                    self.reporter.rtt(&summary)?;
                }
                Err(CoreError::Cancelled) => return Err(CoreError::Cancelled.into()),
                Err(e) => tracing::warn!("{}", e),
            }
        }

        if reached == 0 {
            anyhow::bail!("None of {} ping targets answered", targets.len());
        }
        Ok(())
    }
}
