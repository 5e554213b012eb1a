//! Helper functions for integration tests

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ip_monitor::{
    actors::sink::SinkSettings,
    config::{HostTable, InfluxConfig},
    probe::{ProbeOutcome, Prober},
    retry::RetryPolicy,
};

/// Sink settings with no delay between retries
pub fn create_test_sink_settings(max_points: usize) -> SinkSettings {
    SinkSettings {
        location: "lab".to_string(),
        max_points,
        flush_interval: Duration::from_secs(3600),
        retry: RetryPolicy::new(10, Duration::ZERO),
    }
}

/// Influx config pointing at a wiremock server (plain HTTP)
pub fn create_test_influx_config(uri: &str) -> InfluxConfig {
    let url = url_parts(uri);
    InfluxConfig {
        host: url.0,
        port: url.1,
        login: "monitor".to_string(),
        password: "secret".to_string(),
        database: "network".to_string(),
        location: "lab".to_string(),
        ssl: false,
        verify_ssl: true,
        timeout_secs: 5,
    }
}

fn url_parts(uri: &str) -> (String, u16) {
    let without_scheme = uri.trim_start_matches("http://");
    let (host, port) = without_scheme
        .rsplit_once(':')
        .expect("mock server uri has a port");
    (host.to_string(), port.parse().expect("numeric port"))
}

pub fn create_host_table(entries: &[(&str, &str)]) -> HostTable {
    entries
        .iter()
        .map(|(name, addr)| (name.to_string(), addr.to_string()))
        .collect()
}

/// Prober answering from a fixed address → outcome table
pub struct StaticProber {
    answers: HashMap<String, ProbeOutcome>,
}

impl StaticProber {
    pub fn new(answers: &[(&str, ProbeOutcome)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(addr, outcome)| (addr.to_string(), outcome.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl Prober for StaticProber {
    async fn probe(&self, address: &str) -> ProbeOutcome {
        self.answers
            .get(address)
            .cloned()
            .unwrap_or(ProbeOutcome::NoResponse)
    }

    fn deadline(&self) -> Duration {
        Duration::from_millis(200)
    }
}
