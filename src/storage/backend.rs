//! Metrics store trait definition
//!
//! This module defines the `PointWriter` trait every metrics store
//! implementation must provide.

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::MeasurementPoint;

/// Trait for remote time-series stores
///
/// The sink hands over its whole buffer in one call. Implementations must
/// either accept the whole batch or return an error; the sink relies on
/// this to keep its buffer untouched after a failed write.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are moved into the
/// sink actor's task.
#[async_trait]
pub trait PointWriter: Send + Sync {
    /// Write a batch of points
    ///
    /// The slice is borrowed so a failed write can be retried with the
    /// exact same batch.
    async fn write_points(&self, points: &[MeasurementPoint]) -> StorageResult<()>;

    /// Short name used in log lines (e.g. "influxdb", "memory")
    fn name(&self) -> &str;
}
