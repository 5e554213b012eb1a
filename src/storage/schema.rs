//! Measurement point definition and its line-protocol encoding
//!
//! Every probe result becomes one `host_online` point:
//!
//! ```text
//! host_online,host=router,location=home value=1i 1700000000
//! ```
//!
//! Timestamps are kept at second precision, matching the `precision=s`
//! parameter used on writes.

use chrono::{DateTime, SubsecRound, Utc};

/// Measurement name shared by all points
pub const MEASUREMENT: &str = "host_online";

/// Tags attached to every point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTags {
    /// Where the monitor runs (from configuration)
    pub location: String,

    /// Configured host name (key of the host table, not the address)
    pub host: String,
}

/// A single up/down observation for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementPoint {
    measurement: String,
    tags: PointTags,
    timestamp: DateTime<Utc>,
    value: u8,
}

impl MeasurementPoint {
    /// Create a point stamped with the current time
    pub fn now(location: impl Into<String>, host: impl Into<String>, online: bool) -> Self {
        Self::at(location, host, online, Utc::now())
    }

    /// Create a point with an explicit timestamp (truncated to whole seconds)
    pub fn at(
        location: impl Into<String>,
        host: impl Into<String>,
        online: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            measurement: MEASUREMENT.to_string(),
            tags: PointTags {
                location: location.into(),
                host: host.into(),
            },
            timestamp: timestamp.trunc_subsecs(0),
            value: u8::from(online),
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &PointTags {
        &self.tags
    }

    pub fn host(&self) -> &str {
        &self.tags.host
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 1 when the host answered, 0 otherwise
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Encode as one line of InfluxDB line protocol (second precision)
    pub fn to_line_protocol(&self) -> String {
        format!(
            "{},host={},location={} value={}i {}",
            escape_measurement(&self.measurement),
            escape_tag(&self.tags.host),
            escape_tag(&self.tags.location),
            self.value,
            self.timestamp.timestamp()
        )
    }
}

/// Encode a batch of points, one per line
pub fn encode_batch(points: &[MeasurementPoint]) -> String {
    points
        .iter()
        .map(MeasurementPoint::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_measurement(value: &str) -> String {
    escape(value, &[',', ' '])
}

fn escape_tag(value: &str) -> String {
    escape(value, &[',', '=', ' '])
}

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
