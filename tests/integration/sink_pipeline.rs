//! End-to-end tests for the probe → sink → store pipeline
//!
//! These cover the delivery guarantees of the sink:
//! - one point per host per round
//! - retry until success within the attempt bound
//! - buffer kept intact when every attempt fails
//! - overflow keeps only the newest points

use std::sync::Arc;

use ip_monitor::{
    actors::{
        scheduler::Scheduler,
        sink::{MetricsSink, SinkHandle},
    },
    probe::{ProbeOutcome, ProbeRunner},
    storage::{MeasurementPoint, influx::InfluxWriter, memory::MemoryWriter},
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_round_records_one_point_per_host() {
    let hosts = create_host_table(&[("a", "1.1.1.1"), ("b", "2.2.2.2")]);
    let runner = ProbeRunner::new(Arc::new(StaticProber::new(&[
        ("1.1.1.1", ProbeOutcome::Online),
        ("2.2.2.2", ProbeOutcome::Online),
    ])));

    let writer = MemoryWriter::new();
    let sink = SinkHandle::spawn(MetricsSink::new(
        Box::new(writer.clone()),
        create_test_sink_settings(250),
    ));

    let mut scheduler = Scheduler::new(
        hosts,
        runner,
        sink.clone(),
        std::time::Duration::from_secs(60),
    );
    scheduler.run_round().await.unwrap();

    let buffered = sink.get_buffered().await.unwrap();
    let summary: Vec<(&str, u8)> = buffered.iter().map(|p| (p.host(), p.value())).collect();
    assert_eq!(summary, vec![("a", 1), ("b", 1)]);
    assert!(buffered.iter().all(|p| p.tags().location == "lab"));

    sink.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_down_and_failed_hosts_record_zero() {
    let hosts = create_host_table(&[("up", "10.0.0.1"), ("silent", "10.0.0.2"), ("broken", "10.0.0.3")]);
    let runner = ProbeRunner::new(Arc::new(StaticProber::new(&[
        ("10.0.0.1", ProbeOutcome::Online),
        ("10.0.0.2", ProbeOutcome::NoResponse),
        ("10.0.0.3", ProbeOutcome::Failed("ping exited with status 2".to_string())),
    ])));

    let sink = SinkHandle::spawn(MetricsSink::new(
        Box::new(MemoryWriter::new()),
        create_test_sink_settings(250),
    ));

    let mut scheduler = Scheduler::new(hosts, runner, sink.clone(), std::time::Duration::from_secs(60));
    scheduler.run_round().await.unwrap();
    scheduler.run_round().await.unwrap();

    let buffered = sink.get_buffered().await.unwrap();
    assert_eq!(buffered.len(), 6);
    for point in &buffered {
        let expected = u8::from(point.host() == "up");
        assert_eq!(point.value(), expected, "host {}", point.host());
    }

    sink.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_flush_succeeds_on_tenth_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(9)
        .with_priority(1)
        .expect(9)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let writer = InfluxWriter::new(&create_test_influx_config(&mock_server.uri())).unwrap();
    let mut sink = MetricsSink::new(Box::new(writer), create_test_sink_settings(250));

    sink.record("a", true).await;
    sink.record("b", false).await;

    let sent = sink.flush().await.unwrap();

    assert_eq!(sent, 2);
    assert!(sink.buffered().is_empty());
    assert_eq!(sink.stats().points_sent, 2);
    assert_eq!(sink.stats().failed_flushes, 0);
}

#[tokio::test]
async fn test_flush_keeps_buffer_when_all_attempts_fail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(ResponseTemplate::new(503))
        .expect(10)
        .mount(&mock_server)
        .await;

    let writer = InfluxWriter::new(&create_test_influx_config(&mock_server.uri())).unwrap();
    let mut sink = MetricsSink::new(Box::new(writer), create_test_sink_settings(250));

    sink.record("a", true).await;
    sink.record("b", false).await;
    let before = sink.buffered();

    assert!(sink.flush().await.is_err());

    assert_eq!(sink.buffered(), before);
    assert_eq!(sink.stats().failed_flushes, 1);
}

#[tokio::test]
async fn test_outage_keeps_newest_points_only() {
    let writer = MemoryWriter::unreachable();
    let mut sink = MetricsSink::new(Box::new(writer.clone()), create_test_sink_settings(250));

    let points: Vec<MeasurementPoint> = (0..300)
        .map(|n| MeasurementPoint::now("lab", format!("host-{n}"), true))
        .collect();

    for point in points.iter().cloned() {
        sink.record_point(point).await;
        assert!(sink.buffer().len() <= 250);
    }

    assert_eq!(sink.buffered(), points[50..].to_vec());
    assert_eq!(sink.stats().points_dropped, 50);
    assert!(writer.written().is_empty());
}

#[tokio::test]
async fn test_buffer_drains_after_outage_ends() {
    let writer = MemoryWriter::unreachable();
    let mut sink = MetricsSink::new(Box::new(writer.clone()), create_test_sink_settings(5));

    for n in 0..8 {
        sink.record(&format!("host-{n}"), true).await;
    }
    assert_eq!(sink.buffer().len(), 5);

    // store comes back
    writer.fail_next(0);
    let result = sink.record("host-8", false).await;

    assert!(matches!(result, Some(Ok(5))));
    let hosts: Vec<String> = writer.written().iter().map(|p| p.host().to_string()).collect();
    assert_eq!(hosts, vec!["host-4", "host-5", "host-6", "host-7", "host-8"]);
}

#[tokio::test]
async fn test_scheduler_not_blocked_by_slow_store() {
    let hosts = create_host_table(&[("a", "1.1.1.1")]);
    let runner = ProbeRunner::new(Arc::new(StaticProber::new(&[(
        "1.1.1.1",
        ProbeOutcome::Online,
    )])));

    let mut settings = create_test_sink_settings(1);
    settings.retry = ip_monitor::retry::RetryPolicy::new(10, std::time::Duration::from_millis(200));

    let sink = SinkHandle::spawn(MetricsSink::new(
        Box::new(MemoryWriter::unreachable()),
        settings,
    ));

    let mut scheduler = Scheduler::new(hosts, runner, sink.clone(), std::time::Duration::from_secs(60));

    // Each round triggers a ~2s failing flush inside the sink actor; the
    // scheduler only waits for the result to be queued.
    let started = std::time::Instant::now();
    scheduler.run_round().await.unwrap();
    scheduler.run_round().await.unwrap();
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}

#[tokio::test]
async fn test_round_points_share_round_timestamp_during_outage() {
    let hosts = create_host_table(&[("a", "1.1.1.1"), ("b", "2.2.2.2"), ("c", "3.3.3.3")]);
    let runner = ProbeRunner::new(Arc::new(StaticProber::new(&[
        ("1.1.1.1", ProbeOutcome::Online),
        ("2.2.2.2", ProbeOutcome::Online),
        ("3.3.3.3", ProbeOutcome::NoResponse),
    ])));

    // every record triggers a failing flush of roughly one second
    let mut settings = create_test_sink_settings(250);
    settings.flush_interval = std::time::Duration::ZERO;
    settings.retry = ip_monitor::retry::RetryPolicy::new(10, std::time::Duration::from_millis(120));

    let sink = SinkHandle::spawn(MetricsSink::new(
        Box::new(MemoryWriter::unreachable()),
        settings,
    ));

    let mut scheduler = Scheduler::new(hosts, runner, sink.clone(), std::time::Duration::from_secs(60));

    let before = chrono::Utc::now().timestamp();
    scheduler.run_round().await.unwrap();
    let after = chrono::Utc::now().timestamp();

    let buffered = sink.get_buffered().await.unwrap();
    assert_eq!(buffered.len(), 3);

    let first = buffered[0].timestamp();
    assert!(buffered.iter().all(|p| p.timestamp() == first));
    assert!((before..=after).contains(&first.timestamp()));
}
