//! Cooldown and maintenance gating.
//!
//! For an alert of kind K at time T:
//! 1. maintenance mode: log only, `last_sent[K]` untouched
//! 2. `T - last_sent[K] < cooldown`: log only
//! 3. otherwise: enqueue and set `last_sent[K] = T`, whether or not the
//!    queue accepted it

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::alerting::alert::{Alert, AlertKind};
use crate::alerting::queue::AlertQueue;
use crate::config::AlertConfig;
use crate::observability::metrics;

/// What happened to an offered alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Queued,
    Maintenance,
    Cooldown,
    Dropped,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Queued => "queued",
            DispatchOutcome::Maintenance => "maintenance",
            DispatchOutcome::Cooldown => "cooldown",
            DispatchOutcome::Dropped => "dropped",
        }
    }
}

pub struct AlertDispatcher {
    cooldown: Duration,
    maintenance_mode: bool,
    last_sent: HashMap<AlertKind, DateTime<Utc>>,
    queue: AlertQueue,
}

impl AlertDispatcher {
    pub fn new(config: &AlertConfig, queue: AlertQueue) -> Self {
        // TimeDelta caps at i64::MAX milliseconds.
        let secs = i64::try_from(config.cooldown_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        let cooldown = Duration::seconds(secs);
        Self {
            cooldown,
            maintenance_mode: config.maintenance_mode,
            last_sent: HashMap::new(),
            queue,
        }
    }

    /// Gate one alert; its own timestamp is the event time.
    pub fn dispatch(&mut self, alert: Alert) -> DispatchOutcome {
        let kind = alert.kind();
        let now = alert.timestamp;

        let outcome = if self.maintenance_mode {
            tracing::info!(
                kind = kind.as_str(),
                "Maintenance mode - alert suppressed: {}",
                alert.title()
            );
            DispatchOutcome::Maintenance
        } else if self.in_cooldown(kind, now) {
            tracing::info!(
                kind = kind.as_str(),
                "Alert cooldown active - not sending: {}",
                alert.title()
            );
            DispatchOutcome::Cooldown
        } else {
            self.last_sent.insert(kind, now);
            match self.queue.offer(alert) {
                Ok(()) => DispatchOutcome::Queued,
                Err(e) => {
                    tracing::warn!(kind = kind.as_str(), error = %e, "Alert dropped");
                    DispatchOutcome::Dropped
                }
            }
        };

        metrics::record_alert(kind.as_str(), outcome.as_str());
        outcome
    }

    fn in_cooldown(&self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(&kind) {
            Some(last) => now.signed_duration_since(*last) < self.cooldown,
            None => false,
        }
    }

    /// Last time an alert of `kind` was handed to the queue.
    pub fn last_sent(&self, kind: AlertKind) -> Option<DateTime<Utc>> {
        self.last_sent.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::alert::{AlertContext, AlertPayload};
    use crate::alerting::queue::alert_queue;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 30, 12, 0, 0).unwrap()
    }

    fn failover(at: DateTime<Utc>) -> Alert {
        Alert::new(
            AlertPayload::Failover {
                previous: "blue".into(),
                current: "green".into(),
            },
            AlertContext::default(),
            at,
        )
    }

    fn recovery(at: DateTime<Utc>) -> Alert {
        Alert::new(
            AlertPayload::PoolRecovery {
                previous: "green".into(),
                current: "blue".into(),
            },
            AlertContext::default(),
            at,
        )
    }

    fn config(cooldown_secs: u64, maintenance_mode: bool) -> AlertConfig {
        AlertConfig {
            cooldown_secs,
            maintenance_mode,
            ..AlertConfig::default()
        }
    }

    #[test]
    fn test_cooldown_per_kind() {
        let (queue, mut rx) = alert_queue(16);
        let mut dispatcher = AlertDispatcher::new(&config(300, false), queue);

        assert_eq!(
            dispatcher.dispatch(failover(base())),
            DispatchOutcome::Queued
        );
        assert_eq!(
            dispatcher.dispatch(failover(base() + Duration::seconds(10))),
            DispatchOutcome::Cooldown
        );
        // A different kind is not affected.
        assert_eq!(
            dispatcher.dispatch(recovery(base() + Duration::seconds(10))),
            DispatchOutcome::Queued
        );
        assert_eq!(
            dispatcher.dispatch(failover(base() + Duration::seconds(301))),
            DispatchOutcome::Queued
        );

        let mut delivered = 0;
        while rx.try_recv().is_ok() {
            delivered += 1;
        }
        assert_eq!(delivered, 3);
        assert_eq!(
            dispatcher.last_sent(AlertKind::Failover),
            Some(base() + Duration::seconds(301))
        );
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let (queue, _rx) = alert_queue(16);
        let mut dispatcher = AlertDispatcher::new(&config(300, false), queue);
        dispatcher.dispatch(failover(base()));
        assert_eq!(
            dispatcher.dispatch(failover(base() + Duration::seconds(300))),
            DispatchOutcome::Queued
        );
    }

    #[test]
    fn test_maintenance_suppresses_without_touching_cooldown() {
        let (queue, mut rx) = alert_queue(16);
        let mut dispatcher = AlertDispatcher::new(&config(300, true), queue);

        for i in 0..5 {
            let at = base() + Duration::seconds(i * 400);
            assert_eq!(
                dispatcher.dispatch(failover(at)),
                DispatchOutcome::Maintenance
            );
            assert_eq!(
                dispatcher.dispatch(recovery(at)),
                DispatchOutcome::Maintenance
            );
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(dispatcher.last_sent(AlertKind::Failover), None);
        assert_eq!(dispatcher.last_sent(AlertKind::Recovery), None);
    }

    #[test]
    fn test_dropped_alert_still_starts_cooldown() {
        let (queue, _rx) = alert_queue(1);
        let mut dispatcher = AlertDispatcher::new(&config(60, false), queue);
        dispatcher.dispatch(recovery(base()));
        assert_eq!(
            dispatcher.dispatch(failover(base())),
            DispatchOutcome::Dropped
        );
        assert_eq!(dispatcher.last_sent(AlertKind::Failover), Some(base()));
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let (queue, _rx) = alert_queue(16);
        let mut dispatcher = AlertDispatcher::new(&config(0, false), queue);
        for _ in 0..2 {
            assert_eq!(
                dispatcher.dispatch(failover(base())),
                DispatchOutcome::Queued
            );
        }
    }
}
