//! Webhook delivery and the full watcher against a mock receiver.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use pool_watcher::alerting::{
    alert_queue, Alert, AlertContext, AlertPayload, NotificationWorker, Notifier, NotifyError,
    WebhookNotifier,
};
use pool_watcher::config::WatcherConfig;
use pool_watcher::lifecycle::{self, Shutdown};

mod common;
use common::{append, log_line, start_mock_webhook, wait_until};

fn failover() -> Alert {
    Alert::new(
        AlertPayload::Failover {
            previous: "blue".into(),
            current: "green".into(),
        },
        AlertContext {
            total_requests: 42,
            pool_changes: 1,
        },
        Utc::now(),
    )
}

fn titles(captured: &common::Captured) -> Vec<String> {
    captured
        .lock()
        .unwrap()
        .iter()
        .filter_map(|body| serde_json::from_str::<Value>(body).ok())
        .filter_map(|v| v["attachments"][0]["title"].as_str().map(String::from))
        .collect()
}

async fn received_titles(captured: &common::Captured, count: usize) -> bool {
    wait_until(Duration::from_secs(3), || titles(captured).len() >= count).await
}

#[tokio::test]
async fn test_webhook_posts_attachment() {
    let (addr, captured) = start_mock_webhook(200).await;
    let notifier =
        WebhookNotifier::new(&format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap();

    notifier.send(&failover()).await.unwrap();

    let body: Value = serde_json::from_str(&captured.lock().unwrap()[0]).unwrap();
    let attachment = &body["attachments"][0];
    assert_eq!(attachment["color"], "warning");
    assert_eq!(attachment["title"], ":warning: - Failover Detected");
    let text = attachment["text"].as_str().unwrap();
    assert!(text.contains("Previous Pool: *blue*"));
    assert!(text.contains("Total Requests: 42"));
    assert!(attachment["footer"].as_str().unwrap().starts_with("Time: "));
}

#[tokio::test]
async fn test_webhook_non_success_is_an_error() {
    let (addr, _captured) = start_mock_webhook(500).await;
    let notifier =
        WebhookNotifier::new(&format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap();

    match notifier.send(&failover()).await {
        Err(NotifyError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_webhook_is_an_error() {
    // Grab a free port, then close it again.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let notifier =
        WebhookNotifier::new(&format!("http://{addr}/hook"), Duration::from_secs(2)).unwrap();

    assert!(matches!(
        notifier.send(&failover()).await,
        Err(NotifyError::Http(_))
    ));
}

#[tokio::test]
async fn test_worker_survives_failed_deliveries() {
    let (addr, captured) = start_mock_webhook(503).await;
    let notifier: Arc<dyn Notifier> = Arc::new(
        WebhookNotifier::new(&format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap(),
    );

    let (queue, rx) = alert_queue(8);
    for _ in 0..3 {
        queue.offer(failover()).unwrap();
    }
    drop(queue);

    NotificationWorker::new(rx, notifier).run().await;
    // Each alert is attempted exactly once.
    assert_eq!(captured.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_watcher_end_to_end() {
    let (addr, captured) = start_mock_webhook(200).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.log");
    append(&path, &format!("{}\n", log_line(200, "200", "green"))).await;

    let mut config = WatcherConfig::default();
    config.source.path = path.to_string_lossy().into_owned();
    config.source.poll_interval_ms = 20;
    config.detection.initial_pool = Some("blue".into());
    config.alerts.webhook_url = Some(format!("http://{addr}/hook"));

    let shutdown = Shutdown::new();
    let watcher = tokio::spawn(lifecycle::run(config, shutdown.clone()));

    assert!(received_titles(&captured, 1).await);
    // Let the tailer open the file after the startup alert went out.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut lines = String::new();
    for pool in ["blue", "green", "green", "blue"] {
        lines.push_str(&log_line(200, "200", pool));
        lines.push('\n');
    }
    append(&path, &lines).await;

    assert!(received_titles(&captured, 3).await);
    shutdown.trigger("test finished");
    let result = tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());

    // The pre-existing green record is history and must not count.
    assert_eq!(
        titles(&captured),
        vec![
            ":information_source: - Log Watcher Started",
            ":warning: - Failover Detected",
            ":white_check_mark: - Pool Recovery Detected",
        ]
    );
}

#[tokio::test]
async fn test_maintenance_mode_sends_nothing() {
    let (addr, captured) = start_mock_webhook(200).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.log");
    append(&path, "").await;

    let mut config = WatcherConfig::default();
    config.source.path = path.to_string_lossy().into_owned();
    config.source.poll_interval_ms = 20;
    config.detection.initial_pool = Some("blue".into());
    config.alerts.webhook_url = Some(format!("http://{addr}/hook"));
    config.alerts.maintenance_mode = true;

    let shutdown = Shutdown::new();
    let watcher = tokio::spawn(lifecycle::run(config, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut lines = String::new();
    for pool in ["green", "blue", "green"] {
        lines.push_str(&log_line(502, "502", pool));
        lines.push('\n');
    }
    append(&path, &lines).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    shutdown.trigger("test finished");
    let result = tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_shutdown_requested_before_start_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.log");
    append(&path, "").await;

    let mut config = WatcherConfig::default();
    config.source.path = path.to_string_lossy().into_owned();

    let shutdown = Shutdown::new();
    shutdown.trigger("SIGTERM during startup");

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        lifecycle::run(config, shutdown),
    )
    .await
    .expect("watcher ignored a shutdown requested before it started");
    assert!(result.is_ok());
}
