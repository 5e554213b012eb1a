//! Bounded point buffer with size and age flush triggers
//!
//! The buffer favors recency: once it holds more than `max_points`, the
//! oldest points are dropped. A flush is due when the buffer is full or
//! when `flush_interval` has passed since the last successful flush.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::storage::MeasurementPoint;

/// Default capacity of the buffer
pub const DEFAULT_MAX_POINTS: usize = 250;

/// Default maximum time between two flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct PointBuffer {
    points: VecDeque<MeasurementPoint>,
    max_points: usize,
    flush_interval: Duration,
    last_flush: Instant,
}

impl PointBuffer {
    /// Create an empty buffer; the flush clock starts now
    pub fn new(max_points: usize, flush_interval: Duration) -> Self {
        let max_points = max_points.max(1);
        Self {
            points: VecDeque::with_capacity(max_points),
            max_points,
            flush_interval,
            last_flush: Instant::now(),
        }
    }

    /// Append a point, dropping the oldest ones if over capacity.
    ///
    /// Returns the number of points dropped.
    pub fn append(&mut self, point: MeasurementPoint) -> usize {
        self.points.push_back(point);
        self.trim()
    }

    fn trim(&mut self) -> usize {
        let excess = self.points.len().saturating_sub(self.max_points);
        self.points.drain(..excess);
        excess
    }

    /// Whether a flush is due at `now`
    pub fn should_flush(&self, now: Instant) -> bool {
        self.points.len() >= self.max_points
            || now.saturating_duration_since(self.last_flush) >= self.flush_interval
    }

    /// Points in insertion order, as one contiguous slice
    pub fn as_slice(&mut self) -> &[MeasurementPoint] {
        self.points.make_contiguous()
    }

    /// Snapshot of the buffered points in insertion order
    pub fn points(&self) -> Vec<MeasurementPoint> {
        self.points.iter().cloned().collect()
    }

    /// Drop everything after a successful write and restart the flush clock
    pub fn mark_flushed(&mut self, at: Instant) {
        self.points.clear();
        self.last_flush = at;
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS, DEFAULT_FLUSH_INTERVAL)
    }
}
