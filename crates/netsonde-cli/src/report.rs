//! Result rendering for the terminal or for a metrics pipeline.

use crate::progress::{format_bytes, format_millis};
use clap::ValueEnum;
use console::style;
use netsonde_core::{MetricPoint, ProbeResult, RttSummary, SelectedServer, ThroughputSample};
use netsonde_discovery::Selection;
use netsonde_transport::TransportStats;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON metric record per line
    Json,
}

/// Renders measurements in the chosen format
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a reporter
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Whether progress spinners make sense alongside this output
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.format == OutputFormat::Text
    }

    /// Print a selection run
    pub fn selection(&self, selection: &Selection) -> anyhow::Result<()> {
        emit(self.render_selection(selection)?);
        Ok(())
    }

    /// Print a single latency probe
    pub fn probe(&self, result: &ProbeResult) -> anyhow::Result<()> {
        emit(self.render_probe(result)?);
        Ok(())
    }

    /// Print a throughput sample
    pub fn throughput(&self, sample: &ThroughputSample) -> anyhow::Result<()> {
        emit(self.render_throughput(sample)?);
        Ok(())
    }

    /// Print a round-trip summary
    pub fn rtt(&self, summary: &RttSummary) -> anyhow::Result<()> {
        emit(self.render_rtt(summary)?);
        Ok(())
    }

    /// Print HTTP traffic totals; nothing when no request was made
    pub fn traffic(&self, stats: &TransportStats) -> anyhow::Result<()> {
        emit(self.render_traffic(stats)?);
        Ok(())
    }

    fn render_traffic(&self, stats: &TransportStats) -> anyhow::Result<Vec<String>> {
        if stats.requests == 0 && stats.errors == 0 {
            return Ok(Vec::new());
        }
        match self.format {
            OutputFormat::Json => json_lines(&[MetricPoint::new("transport")
                .field("bytes_sent", stats.bytes_sent as f64)
                .field("bytes_received", stats.bytes_received as f64)
                .field("requests", stats.requests as f64)
                .field("errors", stats.errors as f64)]),
            OutputFormat::Text => Ok(vec![
                style(format!(
                    "Transferred {} over {} requests ({} failed)",
                    format_bytes(stats.total_bytes()),
                    stats.requests,
                    stats.errors
                ))
                .dim()
                .to_string(),
            ]),
        }
    }

    fn render_selection(&self, selection: &Selection) -> anyhow::Result<Vec<String>> {
        match self.format {
            OutputFormat::Json => {
                let mut points: Vec<MetricPoint> =
                    selection.probes.iter().map(MetricPoint::from).collect();
                points.push(selected_point(&selection.server));
                json_lines(&points)
            }
            OutputFormat::Text => {
                let mut lines = vec![format!(
                    "{} {}",
                    style("Selected server:").bold(),
                    style(&selection.server).green()
                )];
                for probe in &selection.probes {
                    lines.push(format!(
                        "  {:<40} {}",
                        probe.hostname,
                        format_millis(probe.latency_ms)
                    ));
                }
                for host in &selection.unreachable {
                    lines.push(format!("  {:<40} {}", host, style("unreachable").red()));
                }
                Ok(lines)
            }
        }
    }

    fn render_probe(&self, result: &ProbeResult) -> anyhow::Result<Vec<String>> {
        match self.format {
            OutputFormat::Json => json_lines(&[MetricPoint::from(result)]),
            OutputFormat::Text => Ok(vec![format!(
                "{}: {}",
                style(&result.hostname).bold(),
                format_millis(result.latency_ms)
            )]),
        }
    }

    fn render_throughput(&self, sample: &ThroughputSample) -> anyhow::Result<Vec<String>> {
        match self.format {
            OutputFormat::Json => json_lines(&[MetricPoint::from(sample)]),
            OutputFormat::Text => {
                let label = match sample.direction {
                    netsonde_core::Direction::Download => "Download:",
                    netsonde_core::Direction::Upload => "Upload:",
                };
                Ok(vec![format!(
                    "{} {} ({} in {}) via {}",
                    style(label).bold(),
                    style(sample.rate()).cyan(),
                    format_bytes(sample.bytes),
                    format_millis(sample.elapsed_ms),
                    sample.server_host
                )])
            }
        }
    }

    fn render_rtt(&self, summary: &RttSummary) -> anyhow::Result<Vec<String>> {
        match self.format {
            OutputFormat::Json => json_lines(&summary.points()),
            OutputFormat::Text => Ok(vec![format!(
                "{}: min/avg/max = {:.2}/{:.2}/{:.2} ms ({}/{} connected)",
                style(&summary.target).bold(),
                summary.min_ms,
                summary.avg_ms,
                summary.max_ms,
                summary.successes,
                summary.attempts
            )]),
        }
    }
}

fn selected_point(server: &SelectedServer) -> MetricPoint {
    MetricPoint::new("selected_server")
        .tag("server", server.hostname.clone())
        .field("latency_ms", server.latency_ms)
}

fn json_lines(points: &[MetricPoint]) -> anyhow::Result<Vec<String>> {
    points
        .iter()
        .map(|point| point.to_json().map_err(anyhow::Error::from))
        .collect()
}

fn emit(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
