//! Latency-driven server selection.
//!
//! Distance only decides which candidates get probed. Among the
//! short-list, the lowest measured latency wins, regardless of which
//! candidate is geographically closest.

use crate::directory::DirectorySource;
use crate::ranking::rank;
use netsonde_core::{Error, ProbeResult, Prober, Result, SelectedServer};
use tokio_util::sync::CancellationToken;

/// Candidates probed per selection run
pub const DEFAULT_SHORTLIST_SIZE: usize = 10;

/// Outcome of a selection run
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The chosen server
    pub server: SelectedServer,
    /// Every successful probe, in short-list order
    pub probes: Vec<ProbeResult>,
    /// Short-listed hosts that did not answer
    pub unreachable: Vec<String>,
}

/// Selects the lowest-latency server among the closest candidates
pub struct ServerSelector<D, P> {
    directory: D,
    prober: P,
    shortlist_size: usize,
    cancel: CancellationToken,
}

impl<D: DirectorySource, P: Prober> ServerSelector<D, P> {
    /// Create a selector with the default short-list size
    #[must_use]
    pub fn new(directory: D, prober: P) -> Self {
        Self {
            directory,
            prober,
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
            cancel: CancellationToken::new(),
        }
    }

    /// Set how many of the closest candidates are probed (at least one)
    #[must_use]
    pub fn with_shortlist_size(mut self, size: usize) -> Self {
        self.shortlist_size = size.max(1);
        self
    }

    /// Stop between probes once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run a selection and return only the chosen server.
    ///
    /// # Errors
    ///
    /// See [`ServerSelector::select`].
    pub async fn select_server(&self) -> Result<SelectedServer> {
        Ok(self.select().await?.server)
    }

    /// Run a full selection: discover, rank, short-list, probe, pick.
    ///
    /// # Errors
    ///
    /// - [`Error::DiscoveryUnavailable`] if the directory cannot be fetched
    /// - [`Error::NoServerFound`] if no short-listed candidate answered
    /// - [`Error::Cancelled`] if cancelled between probes
    pub async fn select(&self) -> Result<Selection> {
        self.check_cancelled()?;
        let directory = self.directory.fetch().await?;

        let ranked = rank(directory.origin, &directory.candidates);
        let shortlist: Vec<String> = ranked
            .iter()
            .take(self.shortlist_size)
            .filter_map(|candidate| {
                let host = candidate.hostname();
                if host.is_none() {
                    tracing::debug!("skipping non-upload URL {}", candidate.url);
                }
                host
            })
            .collect();

        tracing::debug!(
            "probing {} of {} ranked candidates",
            shortlist.len(),
            ranked.len()
        );

        let outcomes = self.probe_all(&shortlist).await?;

        let mut probes = Vec::new();
        let mut unreachable = Vec::new();
        for (host, outcome) in outcomes {
            match outcome {
                Ok(result) => probes.push(result),
                Err(_) => unreachable.push(host),
            }
        }

        let server = fastest(probes.iter().cloned())
            .map(SelectedServer::from)
            .ok_or(Error::NoServerFound {
                probed: shortlist.len(),
            })?;

        tracing::info!(
            "selected {} ({}/{} candidates reachable)",
            server,
            probes.len(),
            shortlist.len()
        );

        Ok(Selection {
            server,
            probes,
            unreachable,
        })
    }

    /// Probe each host in turn; only cancellation aborts the sweep.
    async fn probe_all(&self, hosts: &[String]) -> Result<Vec<(String, Result<ProbeResult>)>> {
        let mut outcomes = Vec::with_capacity(hosts.len());

        for host in hosts {
            self.check_cancelled()?;
            let outcome = self.prober.probe(host).await;
            match &outcome {
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => tracing::warn!("excluding {}: {}", host, e),
                Ok(_) => {}
            }
            outcomes.push((host.clone(), outcome));
        }

        Ok(outcomes)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Lowest-latency result; the earliest wins a tie. `None` for no results.
#[must_use]
pub fn fastest(results: impl IntoIterator<Item = ProbeResult>) -> Option<ProbeResult> {
    results.into_iter().fold(None, |best, candidate| match best {
        Some(best) if best.latency_ms <= candidate.latency_ms => Some(best),
        _ => Some(candidate),
    })
}
