//! InfluxDB 1.x writer
//!
//! Points are posted to the `/write` endpoint in line protocol with second
//! precision. Credentials are sent via HTTP basic auth; the connection uses
//! HTTPS unless `ssl` is disabled in the configuration.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{instrument, trace, warn};

use super::backend::PointWriter;
use super::error::{StorageError, StorageResult};
use super::schema::{MeasurementPoint, encode_batch};
use crate::config::InfluxConfig;

/// Writer for the InfluxDB HTTP API
pub struct InfluxWriter {
    /// HTTP client (reused across writes)
    client: reqwest::Client,

    /// Fully built write URL including database and precision
    write_url: reqwest::Url,

    login: String,
    password: String,
}

impl InfluxWriter {
    /// Build a writer from the store configuration
    pub fn new(config: &InfluxConfig) -> StorageResult<Self> {
        let scheme = if config.ssl { "https" } else { "http" };
        let base = format!("{scheme}://{}:{}/write", config.host, config.port);

        let write_url = reqwest::Url::parse_with_params(
            &base,
            &[("db", config.database.as_str()), ("precision", "s")],
        )
        .map_err(|e| StorageError::InvalidConfig(format!("invalid store address {base}: {e}")))?;

        if config.ssl && !config.verify_ssl {
            warn!("certificate verification disabled for {}", config.host);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            client,
            write_url,
            login: config.login.clone(),
            password: config.password.clone(),
        })
    }

    /// The URL points are posted to
    pub fn write_url(&self) -> &str {
        self.write_url.as_str()
    }
}

#[async_trait]
impl PointWriter for InfluxWriter {
    #[instrument(skip_all, fields(points = points.len()))]
    async fn write_points(&self, points: &[MeasurementPoint]) -> StorageResult<()> {
        let body = encode_batch(points);

        trace!("posting {} bytes to {}", body.len(), self.write_url);

        let response = self
            .client
            .post(self.write_url.clone())
            .basic_auth(&self.login, Some(&self.password))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(StorageError::Unauthorized(status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::WriteRejected {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &str {
        "influxdb"
    }
}
