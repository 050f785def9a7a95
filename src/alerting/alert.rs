//! Alert model and human-readable rendering.

use chrono::{DateTime, Utc};

use crate::detection::{ErrorRateSnapshot, Monitor, MonitorEvent};

/// Alert category. Cooldown is tracked per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Startup,
    Failover,
    Recovery,
    HighErrorRate,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Startup => "startup",
            AlertKind::Failover => "failover",
            AlertKind::Recovery => "recovery",
            AlertKind::HighErrorRate => "high_error_rate",
        }
    }
}

/// Severity marker carried to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Resolved,
}

impl Severity {
    /// Attachment colour understood by the webhook.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Info => "#439FE0",
            Severity::Warning => "warning",
            Severity::Critical => "danger",
            Severity::Resolved => "good",
        }
    }
}

/// What the alert is about.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertPayload {
    Startup {
        source: String,
        threshold: f64,
        window_size: usize,
        cooldown_secs: u64,
        maintenance_mode: bool,
    },
    /// Manually requested delivery check.
    Test { source: String },
    Failover { previous: String, current: String },
    PoolRecovery { previous: String, current: String },
    HighErrorRate {
        snapshot: ErrorRateSnapshot,
        current_pool: Option<String>,
    },
    ErrorRateRecovery {
        snapshot: ErrorRateSnapshot,
        current_pool: Option<String>,
    },
}

/// Counters at the time the alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertContext {
    pub total_requests: u64,
    pub pool_changes: u64,
}

/// One message for the notification channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub payload: AlertPayload,
    pub context: AlertContext,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(payload: AlertPayload, context: AlertContext, timestamp: DateTime<Utc>) -> Self {
        Self {
            payload,
            context,
            timestamp,
        }
    }

    /// Build the alert for a tracker event, with counters taken from `monitor`.
    pub fn from_event(event: MonitorEvent, monitor: &Monitor, timestamp: DateTime<Utc>) -> Self {
        let current_pool = monitor.current_pool().map(str::to_string);
        let payload = match event {
            MonitorEvent::Failover { from, to } => AlertPayload::Failover {
                previous: from,
                current: to,
            },
            MonitorEvent::PoolRecovered { from, to } => AlertPayload::PoolRecovery {
                previous: from,
                current: to,
            },
            MonitorEvent::HighErrorRate(snapshot) => AlertPayload::HighErrorRate {
                snapshot,
                current_pool,
            },
            MonitorEvent::ErrorRateRecovered(snapshot) => AlertPayload::ErrorRateRecovery {
                snapshot,
                current_pool,
            },
        };
        let context = AlertContext {
            total_requests: monitor.total_requests(),
            pool_changes: monitor.pool_changes(),
        };
        Self::new(payload, context, timestamp)
    }

    pub fn kind(&self) -> AlertKind {
        match self.payload {
            AlertPayload::Startup { .. } | AlertPayload::Test { .. } => AlertKind::Startup,
            AlertPayload::Failover { .. } => AlertKind::Failover,
            AlertPayload::PoolRecovery { .. } | AlertPayload::ErrorRateRecovery { .. } => {
                AlertKind::Recovery
            }
            AlertPayload::HighErrorRate { .. } => AlertKind::HighErrorRate,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.kind() {
            AlertKind::Startup => Severity::Info,
            AlertKind::Failover => Severity::Warning,
            AlertKind::HighErrorRate => Severity::Critical,
            AlertKind::Recovery => Severity::Resolved,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.payload {
            AlertPayload::Startup { .. } => ":information_source: - Log Watcher Started",
            AlertPayload::Test { .. } => ":information_source: - Log Watcher Test Alert",
            AlertPayload::Failover { .. } => ":warning: - Failover Detected",
            AlertPayload::PoolRecovery { .. } => ":white_check_mark: - Pool Recovery Detected",
            AlertPayload::HighErrorRate { .. } => ":rotating_light: - High Error Rate Detected",
            AlertPayload::ErrorRateRecovery { .. } => ":white_check_mark: - Error Rate Recovered",
        }
    }

    /// Message body listing the relevant counters.
    pub fn body(&self) -> String {
        let ctx = &self.context;
        match &self.payload {
            AlertPayload::Startup {
                source,
                threshold,
                window_size,
                cooldown_secs,
                maintenance_mode,
            } => format!(
                "• Monitoring: {source}\n• Error Threshold: {threshold}%\n\
                 • Window Size: {window_size} requests\n• Alert Cooldown: {cooldown_secs}s\n\
                 • Maintenance Mode: {maintenance_mode}"
            ),
            AlertPayload::Test { source } => {
                format!("Delivery check from the log watcher.\n\n• Monitoring: {source}")
            }
            AlertPayload::Failover { previous, current } => format!(
                "Pool switch detected - traffic is now being served by the backup pool.\n\n\
                 - Previous Pool: *{previous}*\n- New Pool: *{current}*\n\
                 - Total Requests: {}\n- Failover Count: {}\n\n\
                 *Action Required:* Check the health of the *{previous}* pool.",
                ctx.total_requests, ctx.pool_changes
            ),
            AlertPayload::PoolRecovery { previous, current } => format!(
                "Traffic has recovered back to the primary pool.\n\n\
                 - Previous Pool: *{previous}*\n- Current Pool: *{current}*\n\
                 - Total Requests: {}\n- Failover Count: {}",
                ctx.total_requests, ctx.pool_changes
            ),
            AlertPayload::HighErrorRate {
                snapshot,
                current_pool,
            } => format!(
                "Upstream error rate has exceeded the threshold.\n\n\
                 - Current Error Rate: *{:.2}%*\n- Threshold: {}%\n\
                 - Errors in Window: {}/{}\n- Current Pool: *{}*\n- Total Requests: {}\n\n\
                 *Action Required:* Investigate upstream logs and consider toggling pools.",
                snapshot.rate,
                snapshot.threshold,
                snapshot.errors,
                snapshot.samples,
                current_pool.as_deref().unwrap_or("unknown"),
                ctx.total_requests
            ),
            AlertPayload::ErrorRateRecovery {
                snapshot,
                current_pool,
            } => format!(
                "System has recovered from high error rate.\n\n\
                 - Current Pool: *{}*\n- Current Error Rate: *{:.2}%*\n- Threshold: {}%\n\
                 - Total Requests: {}\n- Failover Count: {}",
                current_pool.as_deref().unwrap_or("unknown"),
                snapshot.rate,
                snapshot.threshold,
                ctx.total_requests,
                ctx.pool_changes
            ),
        }
    }

    pub fn footer(&self) -> String {
        format!("Time: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}
