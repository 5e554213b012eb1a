//! Metrics store writers
//!
//! This module provides a trait-based abstraction for shipping measurement
//! points to a time-series store.
//!
//! ## Design
//!
//! - **Trait-based**: `PointWriter` allows swapping implementations
//! - **Async**: All operations are async for use inside the sink actor
//! - **Batch-oriented**: The whole buffer is written in one request
//!
//! ## Writers
//!
//! - **InfluxDB** (default): HTTP write API, line protocol, basic auth
//! - **In-Memory**: No remote store, for dry runs and tests
//!
//! ## Usage
//!
//! ```no_run
//! use ip_monitor::config::read_config_file;
//! use ip_monitor::storage::{PointWriter, influx::InfluxWriter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = read_config_file("ip-monitor.config")?;
//!     let writer = InfluxWriter::new(&config.influx)?;
//!     println!("writing to {} via {}", writer.write_url(), writer.name());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod influx;
pub mod memory;
pub mod schema;

pub use backend::PointWriter;
pub use error::{StorageError, StorageResult};
pub use schema::MeasurementPoint;
