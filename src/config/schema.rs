//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the watcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the log watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct WatcherConfig {
    /// Access log source settings.
    pub source: SourceConfig,

    /// Error-rate and pool detection settings.
    pub detection: DetectionConfig,

    /// Alert delivery policy.
    pub alerts: AlertConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Access log source configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Path of the structured access log to follow.
    pub path: String,

    /// Fallback poll interval when no file events arrive, in milliseconds.
    pub poll_interval_ms: u64,

    /// Attempts to (re)open the log before giving up.
    pub open_max_attempts: u32,

    /// Base delay for open retries in milliseconds.
    pub open_base_delay_ms: u64,

    /// Maximum delay for open retries in milliseconds.
    pub open_max_delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: "/var/log/nginx/access.log".to_string(),
            poll_interval_ms: 250,
            open_max_attempts: 30,
            open_base_delay_ms: 500,
            open_max_delay_ms: 5000,
        }
    }
}

/// Detection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Pool considered primary. When unset, the first observed pool is used.
    pub initial_pool: Option<String>,

    /// Error rate (percent) above which the system is degraded.
    pub error_rate_threshold: f64,

    /// Sliding window capacity (requests).
    pub window_size: usize,

    /// Samples required before the error rate is evaluated.
    /// Clamped to `window_size`.
    pub min_samples: usize,
}

impl DetectionConfig {
    /// Effective minimum sample count.
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.min(self.window_size)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            initial_pool: None,
            error_rate_threshold: 2.0,
            window_size: 200,
            min_samples: 50,
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Incoming webhook endpoint. Alerts go to the local log when unset.
    pub webhook_url: Option<String>,

    /// Minimum spacing between two alerts of the same kind, in seconds.
    pub cooldown_secs: u64,

    /// Suppress all outbound alerts.
    pub maintenance_mode: bool,

    /// Capacity of the pending-notification queue.
    pub queue_capacity: usize,

    /// Timeout for a single webhook request, in seconds.
    pub request_timeout_secs: u64,

    /// Time allowed to flush pending alerts at shutdown, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            cooldown_secs: 300,
            maintenance_mode: false,
            queue_capacity: 64,
            request_timeout_secs: 10,
            drain_timeout_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = WatcherConfig::default();
        assert_eq!(config.detection.error_rate_threshold, 2.0);
        assert_eq!(config.detection.window_size, 200);
        assert_eq!(config.alerts.cooldown_secs, 300);
        assert!(!config.alerts.maintenance_mode);
        assert!(config.detection.initial_pool.is_none());
    }

    #[test]
    fn test_min_samples_clamped_to_window() {
        let detection = DetectionConfig {
            window_size: 5,
            ..DetectionConfig::default()
        };
        assert_eq!(detection.effective_min_samples(), 5);
        assert_eq!(DetectionConfig::default().effective_min_samples(), 50);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: WatcherConfig = toml::from_str(
            r#"
            [detection]
            window_size = 10

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.detection.window_size, 10);
        assert_eq!(config.detection.error_rate_threshold, 2.0);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.source, SourceConfig::default());
    }
}
