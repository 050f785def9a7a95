//! Bounded hand-off between the ingestion loop and the notification worker.
//!
//! The ingestion loop never waits on the network: it offers alerts with
//! `try_send`, and when the queue is full the newest alert is dropped.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::alerting::alert::Alert;
use crate::alerting::notifier::Notifier;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("notification queue full")]
    Full,

    #[error("notification worker stopped")]
    Closed,
}

/// Producer side, held by the dispatcher.
#[derive(Debug, Clone)]
pub struct AlertQueue {
    tx: mpsc::Sender<Alert>,
}

/// Create a queue holding at most `capacity` pending alerts.
pub fn alert_queue(capacity: usize) -> (AlertQueue, mpsc::Receiver<Alert>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (AlertQueue { tx }, rx)
}

impl AlertQueue {
    /// Enqueue without waiting.
    pub fn offer(&self, alert: Alert) -> Result<(), QueueError> {
        self.tx.try_send(alert).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// Consumes the queue and hands each alert to the notifier once.
pub struct NotificationWorker {
    rx: mpsc::Receiver<Alert>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationWorker {
    pub fn new(rx: mpsc::Receiver<Alert>, notifier: Arc<dyn Notifier>) -> Self {
        Self { rx, notifier }
    }

    /// Run until every producer has been dropped and the queue is empty.
    pub async fn run(mut self) {
        tracing::info!(
            channel = self.notifier.name(),
            "Notification worker started"
        );

        while let Some(alert) = self.rx.recv().await {
            deliver(self.notifier.as_ref(), &alert).await;
        }

        tracing::info!("Notification worker stopped");
    }
}

/// Send one alert; failures are logged and discarded.
pub async fn deliver(notifier: &dyn Notifier, alert: &Alert) -> bool {
    match notifier.send(alert).await {
        Ok(()) => {
            tracing::info!(
                kind = alert.kind().as_str(),
                channel = notifier.name(),
                "Alert sent: {}",
                alert.title()
            );
            metrics::record_notification(true);
            true
        }
        Err(e) => {
            tracing::error!(
                kind = alert.kind().as_str(),
                channel = notifier.name(),
                error = %e,
                "Failed to send alert"
            );
            metrics::record_notification(false);
            false
        }
    }
}
