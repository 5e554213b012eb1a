use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ip_monitor::{
    actors::{
        scheduler::Scheduler,
        sink::{MetricsSink, SinkHandle, SinkSettings},
    },
    config::{Config, read_config_file},
    probe::{ProbeRunner, ping::PingProber},
    storage::{PointWriter, influx::InfluxWriter, memory::MemoryWriter},
    util::get_config_path,
};
use tokio::sync::watch;
use tracing::{debug, error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (default: $IP_MONITOR_CONFIG or ./ip-monitor.config)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Log level for the monitor
    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Keep points in memory instead of writing them to InfluxDB
    #[arg(long)]
    dry_run: bool,
}

fn init(level: LevelFilter) {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_target("ip_monitor", level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");
    info!("ip-monitor starting");

    let config_path = args.file.clone().unwrap_or_else(get_config_path);
    let config = match read_config_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(config, args.dry_run).await {
        Ok(()) => {
            info!("ip-monitor stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("main loop failed: {e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, dry_run: bool) -> anyhow::Result<()> {
    let writer: Box<dyn PointWriter> = if dry_run {
        warn!("dry run: points are kept in memory and never sent");
        Box::new(MemoryWriter::new())
    } else {
        let writer = InfluxWriter::new(&config.influx).context("failed to set up InfluxDB writer")?;
        debug!("writing points to {}", writer.write_url());
        Box::new(writer)
    };

    let sink = SinkHandle::spawn(MetricsSink::new(
        writer,
        SinkSettings::new(config.influx.location.clone()),
    ));

    let runner = ProbeRunner::new(Arc::new(PingProber::new()));
    let loop_delay = config.loop_delay();
    let mut scheduler = Scheduler::new(config.hosts, runner, sink.clone(), loop_delay);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let result = scheduler.run(shutdown_rx).await;

    // the scheduler's result decides the exit code, not the final flush
    if let Some(stats) = sink.finish().await {
        info!(
            "sent {} points in {} flushes, {} failed flushes, {} points dropped, {} left unsent",
            stats.points_sent,
            stats.flush_count,
            stats.failed_flushes,
            stats.points_dropped,
            stats.buffered
        );
    }

    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            error!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
