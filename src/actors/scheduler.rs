//! Scheduler - Drives probe rounds at a fixed interval
//!
//! ## State Machine
//!
//! ```text
//! IDLE ──(loop_delay elapsed)──► PROBING ──(all hosts done, results queued)──► IDLE
//! ```
//!
//! The first round starts immediately. Rounds never overlap: the next one
//! is only considered after the previous one has finished. While idle, the
//! loop sleeps in short steps and checks the shutdown signal in between.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, trace};

use super::sink::SinkHandle;
use crate::config::HostTable;
use crate::probe::ProbeRunner;

/// Sleep granularity while waiting for the next round
pub const DEFAULT_POLL_STEP: Duration = Duration::from_millis(100);

pub struct Scheduler {
    hosts: HostTable,
    runner: ProbeRunner,
    sink: SinkHandle,
    loop_delay: Duration,
    poll_step: Duration,
    rounds: u64,
}

impl Scheduler {
    pub fn new(hosts: HostTable, runner: ProbeRunner, sink: SinkHandle, loop_delay: Duration) -> Self {
        Self {
            hosts,
            runner,
            sink,
            loop_delay,
            poll_step: DEFAULT_POLL_STEP,
            rounds: 0,
        }
    }

    pub fn with_poll_step(mut self, poll_step: Duration) -> Self {
        self.poll_step = poll_step;
        self
    }

    /// Completed rounds so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Run rounds until `shutdown` flips to true (or its sender is dropped).
    ///
    /// Only a dead sink ends the loop with an error.
    #[instrument(skip_all, fields(hosts = self.hosts.len()))]
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "monitoring {} hosts every {:?}",
            self.hosts.len(),
            self.loop_delay
        );

        // None forces the first round right away
        let mut last_round: Option<Instant> = None;

        loop {
            if *shutdown.borrow() {
                debug!("shutdown requested, leaving scheduler loop");
                break;
            }

            let due = last_round.is_none_or(|at| at.elapsed() >= self.loop_delay);

            if due {
                let started = Instant::now();
                self.run_round().await?;
                last_round = Some(started);
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_step) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("shutdown signal dropped, leaving scheduler loop");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Probe every host once and queue one point per host on the sink.
    #[instrument(skip(self), fields(round = self.rounds + 1))]
    pub async fn run_round(&mut self) -> Result<()> {
        trace!("starting probe round");
        let started = Instant::now();

        let results = self.runner.probe_all(&self.hosts).await;
        let probed_at = Utc::now();

        let online = results.values().filter(|o| o.is_online()).count();
        for (host, outcome) in results {
            self.sink
                .record_at(host, outcome.is_online(), probed_at)
                .await
                .context("metrics sink is no longer running")?;
        }

        self.rounds += 1;
        debug!(
            "round finished in {:?}: {online}/{} hosts online",
            started.elapsed(),
            self.hosts.len()
        );

        Ok(())
    }
}
