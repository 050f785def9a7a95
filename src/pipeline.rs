//! Per-line processing: parse, detect, dispatch.

use chrono::{DateTime, Utc};

use crate::alerting::{Alert, AlertContext, AlertDispatcher, AlertPayload, DispatchOutcome};
use crate::config::WatcherConfig;
use crate::detection::Monitor;
use crate::ingest::parse_line;
use crate::observability::metrics;

/// Which time an event is stamped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClock {
    /// Wall clock at processing time (live tailing).
    Wall,
    /// The record's own timestamp when parsable, else wall clock (replay).
    Record,
}

/// Everything the ingestion loop mutates, in one place.
pub struct Pipeline {
    monitor: Monitor,
    dispatcher: AlertDispatcher,
    clock: EventClock,
    malformed: u64,
}

impl Pipeline {
    pub fn new(monitor: Monitor, dispatcher: AlertDispatcher, clock: EventClock) -> Self {
        Self {
            monitor,
            dispatcher,
            clock,
            malformed: 0,
        }
    }

    /// Announce that monitoring started. Called once, before the first line.
    pub fn start(&mut self, config: &WatcherConfig, now: DateTime<Utc>) -> DispatchOutcome {
        let payload = AlertPayload::Startup {
            source: config.source.path.clone(),
            threshold: config.detection.error_rate_threshold,
            window_size: config.detection.window_size,
            cooldown_secs: config.alerts.cooldown_secs,
            maintenance_mode: config.alerts.maintenance_mode,
        };
        self.dispatcher
            .dispatch(Alert::new(payload, AlertContext::default(), now))
    }

    /// Process one raw line. Malformed lines are logged and leave state untouched.
    pub fn handle_line(&mut self, line: &str) -> Vec<DispatchOutcome> {
        if line.trim().is_empty() {
            return Vec::new();
        }

        let record = match parse_line(line) {
            Ok(record) => record,
            Err(e) => {
                self.malformed += 1;
                metrics::record_malformed();
                tracing::warn!(
                    error = %e,
                    line = %truncate(line, 200),
                    "Skipping malformed log line"
                );
                return Vec::new();
            }
        };
        metrics::record_line();

        let now = match self.clock {
            EventClock::Wall => Utc::now(),
            EventClock::Record => record
                .parsed_timestamp()
                .map(|ts| ts.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        };

        tracing::trace!(
            status = record.status,
            upstream = ?record.upstream_status,
            retries = record.retries(),
            pool = ?record.pool,
            release = ?record.release,
            "Record"
        );

        let events = self.monitor.observe(&record);
        events
            .into_iter()
            .map(|event| {
                metrics::record_event(&event);
                let alert = Alert::from_event(event, &self.monitor, now);
                self.dispatcher.dispatch(alert)
            })
            .collect()
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Lines rejected by the parser so far.
    pub fn malformed_lines(&self) -> u64 {
        self.malformed
    }
}

fn truncate(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
