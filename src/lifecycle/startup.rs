//! Startup orchestration.
//!
//! # Order
//! 1. metrics exporter (optional)
//! 2. notifier + queue + notification worker
//! 3. pipeline (monitor + dispatcher), startup alert
//! 4. tailer, until shutdown or fatal source loss
//! 5. close the queue and drain the worker within the deadline

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::alerting::{
    alert_queue, build_notifier, Alert, AlertContext, AlertDispatcher, AlertPayload,
    ConsoleNotifier, DispatchOutcome, NotificationWorker, Notifier, NotifyError,
};
use crate::alerting::queue::deliver;
use crate::config::WatcherConfig;
use crate::detection::Monitor;
use crate::lifecycle::shutdown::{drain, Shutdown};
use crate::observability::metrics;
use crate::pipeline::{EventClock, Pipeline};
use crate::tail::{LogTailer, TailError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("notifier setup failed: {0}")]
    Notifier(#[from] NotifyError),

    #[error(transparent)]
    Tail(#[from] TailError),

    #[error("replay failed: {0}")]
    Replay(#[from] std::io::Error),

    #[error("test alert was not delivered")]
    Undelivered,
}

/// Build the pipeline and its notification worker.
fn assemble(
    config: &WatcherConfig,
    notifier: Arc<dyn Notifier>,
    clock: EventClock,
) -> (Pipeline, NotificationWorker) {
    let (queue, rx) = alert_queue(config.alerts.queue_capacity);
    let pipeline = Pipeline::new(
        Monitor::new(&config.detection),
        AlertDispatcher::new(&config.alerts, queue),
        clock,
    );
    (pipeline, NotificationWorker::new(rx, notifier))
}

/// Run the watcher until `shutdown` fires or the log source is lost.
pub async fn run(config: WatcherConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let signal = shutdown.subscribe();
    log_settings(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let notifier = build_notifier(&config.alerts)?;
    let (mut pipeline, worker) = assemble(&config, notifier, EventClock::Wall);
    let worker = tokio::spawn(worker.run());

    pipeline.start(&config, Utc::now());

    let tailer = LogTailer::new(&config.source);
    let result = tailer
        .run(
            |line| {
                pipeline.handle_line(line);
            },
            signal,
        )
        .await;

    tracing::info!(
        total_requests = pipeline.monitor().total_requests(),
        malformed = pipeline.malformed_lines(),
        "Tailer stopped"
    );

    // Dropping the pipeline closes the queue; the worker finishes what is left.
    drop(pipeline);
    let deadline = Duration::from_secs(config.alerts.drain_timeout_secs);
    drain(worker, deadline).await;

    result.map_err(StartupError::from)
}

/// Summary of a replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub lines: u64,
    pub records: u64,
    pub malformed: u64,
    pub alerts_queued: u64,
    pub final_pool: Option<String>,
    pub degraded: bool,
}

/// Feed an existing log through detection, reporting alerts to the local
/// log only. Events are stamped with the records' own timestamps so
/// cooldowns behave as they would have live.
pub async fn replay(config: &WatcherConfig, path: &Path) -> Result<ReplaySummary, StartupError> {
    let (mut pipeline, worker) = assemble(config, Arc::new(ConsoleNotifier), EventClock::Record);
    let worker = tokio::spawn(worker.run());

    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut summary = ReplaySummary::default();

    while let Some(line) = lines.next_line().await? {
        summary.lines += 1;
        let queued = pipeline
            .handle_line(&line)
            .iter()
            .filter(|outcome| **outcome == DispatchOutcome::Queued)
            .count() as u64;

        // Let the console worker keep up so the bounded queue never drops.
        if queued > 0 {
            summary.alerts_queued += queued;
            tokio::task::yield_now().await;
        }
    }

    summary.malformed = pipeline.malformed_lines();
    summary.records = pipeline.monitor().total_requests();
    summary.final_pool = pipeline.monitor().current_pool().map(str::to_string);
    summary.degraded = pipeline.monitor().is_degraded();

    drop(pipeline);
    let deadline = Duration::from_secs(config.alerts.drain_timeout_secs);
    drain(worker, deadline).await;
    Ok(summary)
}

/// Send one test alert straight to the configured channel.
pub async fn send_test_alert(config: &WatcherConfig) -> Result<(), StartupError> {
    let notifier = build_notifier(&config.alerts)?;
    let alert = Alert::new(
        AlertPayload::Test {
            source: config.source.path.clone(),
        },
        AlertContext::default(),
        Utc::now(),
    );
    if deliver(notifier.as_ref(), &alert).await {
        Ok(())
    } else {
        Err(StartupError::Undelivered)
    }
}

fn log_settings(config: &WatcherConfig) {
    tracing::info!(
        log_path = %config.source.path,
        initial_pool = config.detection.initial_pool.as_deref().unwrap_or("<first record>"),
        error_rate_threshold = config.detection.error_rate_threshold,
        window_size = config.detection.window_size,
        min_samples = config.detection.effective_min_samples(),
        cooldown_secs = config.alerts.cooldown_secs,
        maintenance_mode = config.alerts.maintenance_mode,
        webhook = config.alerts.webhook_url.is_some(),
        "Alert watcher initialized"
    );
}
