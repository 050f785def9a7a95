//! Shutdown coordination.
//!
//! The stop flag is latched: a receiver created after `trigger` still
//! sees it, so a signal that arrives during startup is never lost.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Broadcasts a single stop signal to every long-running task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask every current and future subscriber to stop.
    pub fn trigger(&self, reason: &str) {
        tracing::info!(reason, "Shutting down watcher...");
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested, immediately if it already
    /// was. A dropped [`Shutdown`] counts as a request.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Wait for a finishing task, abandoning it after `deadline`.
///
/// Returns false when the task had to be aborted.
pub async fn drain<T>(mut handle: JoinHandle<T>, deadline: Duration) -> bool {
    match tokio::time::timeout(deadline, &mut handle).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Task failed during drain");
            false
        }
        Err(_) => {
            tracing::warn!(
                deadline = ?deadline,
                "Drain deadline passed, discarding pending work"
            );
            handle.abort();
            false
        }
    }
}
