//! Log tailing subsystem.
//!
//! # Data Flow
//! ```text
//! open log (retry with backoff) → seek to end
//! loop:
//!     wait for: file event (notify) | poll tick | shutdown
//!     → follower.rs reads complete new lines → handler
//!     → follower.rs checks path: truncated / replaced / missing → reopen from start
//! ```
//!
//! # Design Decisions
//! - The parent directory is watched, so rotation by rename is seen
//! - A poll ticker backs up the watcher; if the watcher cannot be created,
//!   polling alone drives the loop
//! - Only a source that stays unavailable past the retry budget is fatal

pub mod follower;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SourceConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::resilience::Backoff;

pub use follower::{LogFollower, SourceChange, StartAt};

#[derive(Debug, Error)]
pub enum TailError {
    #[error("log source {path} unavailable after {attempts} attempts: {source}")]
    Unavailable {
        path: PathBuf,
        attempts: u32,
        source: io::Error,
    },
}

/// Follows the access log and hands each new line to a callback.
pub struct LogTailer {
    path: PathBuf,
    poll_interval: Duration,
    backoff: Backoff,
}

impl LogTailer {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            backoff: Backoff::from_source(config),
        }
    }

    /// Run until shutdown. Pre-existing content is skipped.
    pub async fn run<F>(
        self,
        mut on_line: F,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), TailError>
    where
        F: FnMut(&str),
    {
        if shutdown.is_triggered() {
            return Ok(());
        }
        tracing::info!(path = %self.path.display(), "Starting to tail log file");

        let Some(mut follower) = self.open_with_retry(StartAt::End, &mut shutdown).await? else {
            return Ok(());
        };

        let (wake_tx, mut wake_rx) = mpsc::channel(1);
        let _watcher = self.watch(wake_tx.clone());
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Log watcher ready - monitoring for events");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Tailer received shutdown signal, exiting loop");
                    break;
                }
                _ = wake_rx.recv() => {}
                _ = ticker.tick() => {}
            }

            let change = match follower.read_lines().await {
                Ok(lines) => {
                    for line in &lines {
                        on_line(line);
                    }
                    follower.check_source().await
                }
                Err(e) => Err(e),
            };

            let (reason, start) = match change {
                Ok(SourceChange::Unchanged) => continue,
                Ok(SourceChange::Truncated) => ("truncated", StartAt::Beginning),
                Ok(SourceChange::Replaced) => ("rotated", StartAt::Beginning),
                Ok(SourceChange::Missing) => ("missing", StartAt::Beginning),
                Err(e) => {
                    tracing::warn!(error = %e, "Error reading log source");
                    ("read_error", StartAt::End)
                }
            };

            // Pick up whatever reached the old file before it moved.
            if matches!(reason, "rotated" | "missing") {
                if let Ok(lines) = follower.read_lines().await {
                    for line in &lines {
                        on_line(line);
                    }
                }
            }

            tracing::info!(
                path = %self.path.display(),
                reason,
                offset = follower.position(),
                "Reopening log source"
            );
            metrics::record_reopen(reason);

            match self.open_with_retry(start, &mut shutdown).await? {
                Some(reopened) => follower = reopened,
                None => break,
            }
        }

        drop(wake_tx);
        Ok(())
    }

    /// Open the log, retrying with backoff. `Ok(None)` means shutdown won.
    async fn open_with_retry(
        &self,
        start: StartAt,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Option<LogFollower>, TailError> {
        let mut attempt = 1;
        loop {
            let err = match LogFollower::open(&self.path, start).await {
                Ok(follower) => return Ok(Some(follower)),
                Err(e) => e,
            };

            let Some(delay) = self.backoff.delay(attempt) else {
                return Err(TailError::Unavailable {
                    path: self.path.clone(),
                    attempts: attempt,
                    source: err,
                });
            };

            tracing::info!(
                path = %self.path.display(),
                attempt,
                delay = ?delay,
                error = %err,
                "Waiting for log file"
            );

            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = shutdown.recv() => return Ok(None),
            }
            attempt += 1;
        }
    }

    /// Watch the log's directory; any event for our file wakes the loop.
    fn watch(&self, wake: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name: Option<OsString> = self.path.file_name().map(|n| n.to_os_string());

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == name);
                if ours {
                    let _ = wake.try_send(());
                }
            }
            Err(e) => tracing::warn!("Watch error: {:?}", e),
        };

        let watcher = RecommendedWatcher::new(handler, Config::default()).and_then(|mut w| {
            w.watch(Path::new(&dir), RecursiveMode::NonRecursive)?;
            Ok(w)
        });

        match watcher {
            Ok(w) => {
                tracing::debug!(dir = %dir.display(), "File watcher started");
                Some(w)
            }
            Err(e) => {
                tracing::warn!(error = %e, "File watcher unavailable, polling only");
                None
            }
        }
    }
}
