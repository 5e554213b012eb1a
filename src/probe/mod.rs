//! Reachability probing
//!
//! A [`Prober`] checks a single address. The [`ProbeRunner`] fans out one
//! task per configured host, waits for all of them (each bounded by a
//! deadline) and hands back one [`ProbeOutcome`] per host.
//!
//! ```text
//!               ┌─► task(router) ─┐
//! probe_all ────┼─► task(nas)    ─┼──► { router: Online, nas: NoResponse, ... }
//!               └─► task(...)    ─┘
//! ```

pub mod ping;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use crate::config::HostTable;

/// Extra time granted on top of the prober's own deadline
const DEADLINE_GRACE: Duration = Duration::from_secs(2);

/// Result of probing one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host answered
    Online,

    /// The host did not answer any echo request
    NoResponse,

    /// The probe did not finish within the runner's deadline
    TimedOut,

    /// The probe itself failed (facility missing, crashed, odd exit status)
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_online(&self) -> bool {
        matches!(self, ProbeOutcome::Online)
    }
}

/// Something that can check whether an address is reachable
#[async_trait]
pub trait Prober: Send + Sync {
    /// Check `address` once. Must not panic; failures are outcomes.
    async fn probe(&self, address: &str) -> ProbeOutcome;

    /// How long a single probe may take on its own
    fn deadline(&self) -> Duration;
}

/// Runs one probe round over a host table
#[derive(Clone)]
pub struct ProbeRunner {
    prober: Arc<dyn Prober>,
    deadline: Duration,
}

impl ProbeRunner {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        let deadline = prober.deadline() + DEADLINE_GRACE;
        Self { prober, deadline }
    }

    /// Override the per-host deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Probe every host concurrently and wait for all of them.
    ///
    /// Each host gets its own task; a slow or failing host never affects
    /// the others. The returned map has exactly one entry per host.
    #[instrument(skip_all, fields(hosts = hosts.len()))]
    pub async fn probe_all(&self, hosts: &HostTable) -> BTreeMap<String, ProbeOutcome> {
        let handles: Vec<_> = hosts
            .iter()
            .map(|(name, address)| {
                let prober = Arc::clone(&self.prober);
                let address = address.clone();
                let deadline = self.deadline;

                let handle = tokio::spawn(async move {
                    match tokio::time::timeout(deadline, prober.probe(&address)).await {
                        Ok(outcome) => outcome,
                        Err(_) => ProbeOutcome::TimedOut,
                    }
                });

                (name.clone(), handle)
            })
            .collect();

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        names
            .into_iter()
            .zip(results)
            .map(|(name, result)| {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(e) => ProbeOutcome::Failed(format!("probe task failed: {e}")),
                };
                log_outcome(&name, &outcome);
                (name, outcome)
            })
            .collect()
    }
}

fn log_outcome(host: &str, outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Online => debug!("host '{host}' is online"),
        ProbeOutcome::NoResponse => info!("host '{host}' did not respond"),
        ProbeOutcome::TimedOut => warn!("host '{host}' probe timed out"),
        ProbeOutcome::Failed(reason) => {
            error!("unexpected error checking host '{host}': {reason}")
        }
    }
}
