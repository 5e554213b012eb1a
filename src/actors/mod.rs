//! Actor-based monitoring pipeline
//!
//! ## Architecture Overview
//!
//! ```text
//!        ┌──────────────────┐
//!        │    Scheduler     │  one round every ping_frequency minutes
//!        └────────┬─────────┘
//!                 │ probe_all
//!        ┌────────▼─────────┐
//!        │   ProbeRunner    │  one task per host, joined with a deadline
//!        └────────┬─────────┘
//!                 │ Record { host, online, at }   (mpsc)
//!        ┌────────▼─────────┐
//!        │    SinkActor     │  owns MetricsSink + PointBuffer
//!        └────────┬─────────┘
//!                 │ write_points (bounded retry)
//!        ┌────────▼─────────┐
//!        │   PointWriter    │  InfluxDB or in-memory
//!        └──────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the sink actor has an mpsc command channel
//! 2. **Request/Response**: oneshot channels for flushes, stats and shutdown
//! 3. **Shutdown**: the scheduler watches a `tokio::sync::watch` flag

pub mod buffer;
pub mod messages;
pub mod scheduler;
pub mod sink;
