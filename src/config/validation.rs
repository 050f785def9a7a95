//! Configuration validation.
//!
//! Semantic checks run after deserialization and env overrides. Every
//! problem is reported, not just the first one.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::WatcherConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Dotted path of the offending option, e.g. `detection.window_size`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &WatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let source = &config.source;
    if source.path.trim().is_empty() {
        errors.push(ValidationError::new("source.path", "must not be empty"));
    }
    if source.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "source.poll_interval_ms",
            "must be at least 1",
        ));
    }
    if source.open_max_attempts == 0 {
        errors.push(ValidationError::new(
            "source.open_max_attempts",
            "must be at least 1",
        ));
    }
    if source.open_base_delay_ms > source.open_max_delay_ms {
        errors.push(ValidationError::new(
            "source.open_base_delay_ms",
            format!(
                "{} exceeds open_max_delay_ms {}",
                source.open_base_delay_ms, source.open_max_delay_ms
            ),
        ));
    }

    let detection = &config.detection;
    let threshold = detection.error_rate_threshold;
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        errors.push(ValidationError::new(
            "detection.error_rate_threshold",
            format!("{} is outside 0..=100", threshold),
        ));
    }
    if detection.window_size == 0 {
        errors.push(ValidationError::new(
            "detection.window_size",
            "must be at least 1",
        ));
    }
    if let Some(pool) = &detection.initial_pool {
        if pool.trim().is_empty() {
            errors.push(ValidationError::new(
                "detection.initial_pool",
                "must not be empty when set",
            ));
        }
    }

    let alerts = &config.alerts;
    if let Some(raw) = &alerts.webhook_url {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                "alerts.webhook_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("alerts.webhook_url", e.to_string())),
        }
    }
    if alerts.queue_capacity == 0 {
        errors.push(ValidationError::new(
            "alerts.queue_capacity",
            "must be at least 1",
        ));
    }
    if alerts.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "alerts.request_timeout_secs",
            "must be at least 1",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
