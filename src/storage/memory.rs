//! In-memory writer (no remote store)
//!
//! Keeps the most recent accepted points in memory. It's useful for:
//! - `--dry-run`, to exercise probing and batching without a backend
//! - Tests, including simulated outages via [`MemoryWriter::failing_for`]
//!
//! Clones share the same storage, so a test can keep one clone and hand
//! the other to the sink.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use super::backend::PointWriter;
use super::error::{StorageError, StorageResult};
use super::schema::MeasurementPoint;

/// Default number of accepted points kept in memory
pub const MAX_RETAINED_POINTS: usize = 1000;

#[derive(Debug)]
struct Inner {
    written: VecDeque<MeasurementPoint>,
    capacity: usize,
    accepted: u64,
    attempts: usize,
    failures_left: Option<usize>,
}

/// In-memory point writer
///
/// Only the newest `capacity` points are kept; older ones are evicted so a
/// long dry run stays bounded.
#[derive(Debug, Clone)]
pub struct MemoryWriter {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWriter {
    /// Create a writer that accepts every batch
    pub fn new() -> Self {
        Self::with_capacity(MAX_RETAINED_POINTS)
    }

    /// Create a writer keeping at most `capacity` accepted points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                written: VecDeque::with_capacity(capacity.min(MAX_RETAINED_POINTS)),
                capacity,
                accepted: 0,
                attempts: 0,
                failures_left: None,
            })),
        }
    }

    /// Create a writer whose first `attempts` writes fail
    pub fn failing_for(attempts: usize) -> Self {
        let writer = Self::new();
        writer.lock().failures_left = Some(attempts);
        writer
    }

    /// Create a writer that never accepts a batch
    pub fn unreachable() -> Self {
        Self::failing_for(usize::MAX)
    }

    /// Make the next `attempts` writes fail
    pub fn fail_next(&self, attempts: usize) {
        self.lock().failures_left = Some(attempts);
    }

    /// Retained accepted points, in write order
    pub fn written(&self) -> Vec<MeasurementPoint> {
        self.lock().written.iter().cloned().collect()
    }

    /// Total points accepted, evicted ones included
    pub fn accepted(&self) -> u64 {
        self.lock().accepted
    }

    /// Number of write attempts, failed ones included
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // a poisoned lock only means a test panicked mid-write
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PointWriter for MemoryWriter {
    async fn write_points(&self, points: &[MeasurementPoint]) -> StorageResult<()> {
        let mut inner = self.lock();
        inner.attempts += 1;

        if let Some(left) = inner.failures_left.as_mut()
            && *left > 0
        {
            *left -= 1;
            debug!("in-memory writer: simulated outage ({} failures left)", left);
            return Err(StorageError::ConnectionFailed(
                "simulated outage".to_string(),
            ));
        }

        info!("in-memory writer: accepted {} points", points.len());
        inner.accepted += points.len() as u64;
        inner.written.extend(points.iter().cloned());

        let excess = inner.written.len().saturating_sub(inner.capacity);
        inner.written.drain(..excess);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
