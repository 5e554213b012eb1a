//! MetricsSink and SinkActor - Buffer probe results and ship them to the store
//!
//! ## Architecture
//!
//! [`MetricsSink`] owns the [`PointBuffer`] and a [`PointWriter`]. It is a
//! plain struct with no locking: exactly one task ever touches it. In the
//! running process that task is the [`SinkActor`], so a slow or unreachable
//! store never holds up the scheduler's next probe round.
//!
//! ## Flush Strategy
//!
//! - **Size trigger**: buffer reached `max_points`
//! - **Time trigger**: `flush_interval` passed since the last good flush
//!
//! Both are checked after every recorded point. A flush writes the whole
//! buffer in one batch and retries on failure. On success the buffer is
//! cleared; once the attempts are used up it is kept as is for the next
//! flush. The overflow policy still applies while the store is down, so a
//! long outage loses the oldest points instead of growing without bound.
//!
//! ## Message Flow
//!
//! ```text
//! Scheduler → Record → SinkActor → PointBuffer → (threshold) → flush → PointWriter
//!                          ↑
//!                          └─── Commands (Flush, GetStats, GetBuffered, Shutdown)
//! ```

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, trace, warn};

use super::buffer::{DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_POINTS, PointBuffer};
use super::messages::{SinkCommand, SinkStats};
use crate::retry::RetryPolicy;
use crate::storage::{MeasurementPoint, PointWriter, StorageResult};

/// Capacity of the sink's command channel
const COMMAND_CHANNEL_SIZE: usize = 256;

/// Tunables for a [`MetricsSink`]
#[derive(Debug, Clone)]
pub struct SinkSettings {
    /// Value of the `location` tag
    pub location: String,

    /// Buffer capacity; also the size flush trigger
    pub max_points: usize,

    /// Time flush trigger
    pub flush_interval: Duration,

    /// Retry policy for a single flush
    pub retry: RetryPolicy,
}

impl SinkSettings {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            max_points: DEFAULT_MAX_POINTS,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

/// Point buffer plus the writer that drains it
pub struct MetricsSink {
    writer: Box<dyn PointWriter>,
    buffer: PointBuffer,
    location: String,
    retry: RetryPolicy,
    stats: SinkStats,
}

impl MetricsSink {
    pub fn new(writer: Box<dyn PointWriter>, settings: SinkSettings) -> Self {
        debug!(
            "creating sink for {} (max {} points, flush every {:?}, {} attempts)",
            writer.name(),
            settings.max_points,
            settings.flush_interval,
            settings.retry.max_attempts
        );

        Self {
            writer,
            buffer: PointBuffer::new(settings.max_points, settings.flush_interval),
            location: settings.location,
            retry: settings.retry,
            stats: SinkStats::default(),
        }
    }

    /// Record a probe result for `host` observed now, flushing if a trigger fired.
    ///
    /// Returns the flush result when a flush was attempted.
    pub async fn record(&mut self, host: &str, online: bool) -> Option<StorageResult<usize>> {
        self.record_at(host, online, Utc::now()).await
    }

    /// Record a probe result for `host` observed at `at`
    pub async fn record_at(
        &mut self,
        host: &str,
        online: bool,
        at: DateTime<Utc>,
    ) -> Option<StorageResult<usize>> {
        let point = MeasurementPoint::at(self.location.as_str(), host, online, at);
        self.record_point(point).await
    }

    /// Append a pre-built point, then apply the overflow and flush policies.
    ///
    /// A trim always leaves the buffer full, so any call that drops points
    /// also attempts a flush.
    pub async fn record_point(&mut self, point: MeasurementPoint) -> Option<StorageResult<usize>> {
        trace!("recording {}={} for {}", point.host(), point.value(), self.location);

        let dropped = self.buffer.append(point);
        if dropped > 0 {
            self.stats.points_dropped += dropped as u64;
            warn!(
                "buffer full, dropped {dropped} oldest points ({} dropped in total)",
                self.stats.points_dropped
            );
        }

        if self.buffer.should_flush(Instant::now()) {
            Some(self.flush().await)
        } else {
            None
        }
    }

    /// Write the whole buffer to the store.
    ///
    /// On success the buffer is emptied and the flush clock restarted. When
    /// every attempt fails the buffer is left exactly as it was.
    #[instrument(skip(self), fields(store = self.writer.name()))]
    pub async fn flush(&mut self) -> StorageResult<usize> {
        let count = self.buffer.len();

        if count == 0 {
            trace!("nothing to flush");
            self.buffer.mark_flushed(Instant::now());
            return Ok(0);
        }

        debug!("flushing {count} points");

        let retry = self.retry;
        let writer = self.writer.as_ref();
        let points = self.buffer.as_slice();

        let result = retry
            .run(move |attempt| {
                trace!("write attempt {attempt}");
                writer.write_points(points)
            })
            .await;

        match result {
            Ok(()) => {
                self.buffer.mark_flushed(Instant::now());
                self.stats.flush_count += 1;
                self.stats.points_sent += count as u64;
                info!("sent {count} points to {}", self.writer.name());
                Ok(count)
            }
            Err(e) => {
                self.stats.failed_flushes += 1;
                if e.is_auth() {
                    error!(
                        "failed to send {count} points to {} after {} attempts, check login/password: {e}",
                        self.writer.name(),
                        retry.max_attempts
                    );
                } else {
                    error!(
                        "failed to send {count} points to {} after {} attempts: {e}",
                        self.writer.name(),
                        retry.max_attempts
                    );
                }
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            buffered: self.buffer.len(),
            ..self.stats.clone()
        }
    }

    /// Snapshot of the buffered points, oldest first
    pub fn buffered(&self) -> Vec<MeasurementPoint> {
        self.buffer.points()
    }

    pub fn buffer(&self) -> &PointBuffer {
        &self.buffer
    }
}

/// Actor that owns a [`MetricsSink`]
pub struct SinkActor {
    sink: MetricsSink,

    /// Command receiver
    command_rx: mpsc::Receiver<SinkCommand>,
}

impl SinkActor {
    pub fn new(sink: MetricsSink, command_rx: mpsc::Receiver<SinkCommand>) -> Self {
        Self { sink, command_rx }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command arrives or every handle is dropped.
    /// Either way one last flush is attempted before the actor stops.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting sink actor");

        let mut shutdown_reply = None;

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                SinkCommand::Record { host, online, at } => {
                    self.sink.record_at(&host, online, at).await;
                }

                SinkCommand::RecordPoint { point } => {
                    self.sink.record_point(point).await;
                }

                SinkCommand::Flush { respond_to } => {
                    debug!("manual flush requested");
                    let result = self.sink.flush().await;
                    let _ = respond_to.send(result);
                }

                SinkCommand::GetStats { respond_to } => {
                    let _ = respond_to.send(self.sink.stats());
                }

                SinkCommand::GetBuffered { respond_to } => {
                    let _ = respond_to.send(self.sink.buffered());
                }

                SinkCommand::Shutdown { respond_to } => {
                    debug!("received shutdown command");
                    shutdown_reply = Some(respond_to);
                    break;
                }
            }
        }

        if shutdown_reply.is_none() {
            warn!("command channel closed, shutting down");
        }

        if !self.sink.buffer().is_empty() {
            debug!(
                "final flush before shutdown ({} points)",
                self.sink.buffer().len()
            );
            let _ = self.sink.flush().await;
        }

        if let Some(respond_to) = shutdown_reply {
            let _ = respond_to.send(self.sink.stats());
        }

        debug!("sink actor stopped");
    }
}

/// Handle for controlling a SinkActor
///
/// It can be cloned and shared across tasks.
#[derive(Clone)]
pub struct SinkHandle {
    /// Command sender
    sender: mpsc::Sender<SinkCommand>,
}

impl SinkHandle {
    /// Spawn the sink as an actor and return a handle to it
    pub fn spawn(sink: MetricsSink) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        let actor = SinkActor::new(sink, cmd_rx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Queue a probe result observed now
    pub async fn record(&self, host: impl Into<String>, online: bool) -> Result<()> {
        self.record_at(host, online, Utc::now()).await
    }

    /// Queue a probe result observed at `at`
    ///
    /// The timestamp is fixed here, so a flush running inside the actor
    /// never shifts it. Waits only for room in the command channel.
    pub async fn record_at(
        &self,
        host: impl Into<String>,
        online: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.sender
            .send(SinkCommand::Record {
                host: host.into(),
                online,
                at,
            })
            .await
            .context("failed to send Record command")?;
        Ok(())
    }

    /// Queue a pre-built point
    pub async fn record_point(&self, point: MeasurementPoint) -> Result<()> {
        self.sender
            .send(SinkCommand::RecordPoint { point })
            .await
            .context("failed to send RecordPoint command")?;
        Ok(())
    }

    /// Flush now and wait for the outcome
    pub async fn flush(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SinkCommand::Flush { respond_to: tx })
            .await
            .context("failed to send Flush command")?;

        let sent = rx.await.context("failed to receive response")??;
        Ok(sent)
    }

    pub async fn get_stats(&self) -> Result<SinkStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SinkCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive response")
    }

    /// Copy of the points waiting to be flushed, oldest first
    pub async fn get_buffered(&self) -> Result<Vec<MeasurementPoint>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SinkCommand::GetBuffered { respond_to: tx })
            .await
            .context("failed to send GetBuffered command")?;

        rx.await.context("failed to receive response")
    }

    /// Flush what is left and stop the actor
    ///
    /// Resolves once the final flush attempt is over.
    pub async fn shutdown(&self) -> Result<SinkStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SinkCommand::Shutdown { respond_to: tx })
            .await
            .context("failed to send Shutdown command")?;

        rx.await.context("failed to receive response")
    }

    /// Stop the actor at the end of the process
    ///
    /// Like [`shutdown`](Self::shutdown), but a failure is only logged so
    /// it cannot hide the error that ended the run.
    pub async fn finish(&self) -> Option<SinkStats> {
        if self.is_closed() {
            warn!("sink already stopped, final flush skipped");
            return None;
        }

        match self.shutdown().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("sink shutdown failed: {e:#}");
                None
            }
        }
    }

    /// Whether the actor is gone
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
