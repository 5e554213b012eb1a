//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Messages sent to the sink actor via mpsc
//! 2. **Request/Response**: oneshot channels for flushes and stats queries

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::storage::{MeasurementPoint, StorageResult};

/// Commands that can be sent to the SinkActor
#[derive(Debug)]
pub enum SinkCommand {
    /// Record one probe result observed at `at`
    Record {
        host: String,
        online: bool,
        at: DateTime<Utc>,
    },

    /// Record a pre-built point
    RecordPoint { point: MeasurementPoint },

    /// Flush the buffer now, regardless of the size/age triggers
    ///
    /// Responds with the number of points sent.
    Flush {
        respond_to: oneshot::Sender<StorageResult<usize>>,
    },

    /// Get sink statistics
    GetStats {
        respond_to: oneshot::Sender<SinkStats>,
    },

    /// Get a copy of the buffered points (oldest first)
    GetBuffered {
        respond_to: oneshot::Sender<Vec<MeasurementPoint>>,
    },

    /// Make a final flush attempt and stop
    ///
    /// Responds with the final statistics once the actor is done.
    Shutdown {
        respond_to: oneshot::Sender<SinkStats>,
    },
}

/// Sink statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Points currently waiting in the buffer
    pub buffered: usize,

    /// Successful flushes
    pub flush_count: u64,

    /// Flushes that used up all their attempts
    pub failed_flushes: u64,

    /// Points delivered to the store
    pub points_sent: u64,

    /// Points discarded by the overflow policy
    pub points_dropped: u64,
}
