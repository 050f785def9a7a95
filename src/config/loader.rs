//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::WatcherConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load the configuration: optional TOML file, then process environment
/// overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<WatcherConfig, ConfigError> {
    load_config_with(path, |var| std::env::var(var).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<WatcherConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => WatcherConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment environment variables on top of `config`.
pub fn apply_env_overrides<F>(config: &mut WatcherConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| env(var).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("SLACK_WEBHOOK_URL") {
        config.alerts.webhook_url = Some(url);
    }
    if let Some(pool) = get("ACTIVE_POOL") {
        config.detection.initial_pool = Some(pool.trim().to_string());
    }
    if let Some(path) = get("LOG_PATH") {
        config.source.path = path;
    }
    if let Some(raw) = get("ERROR_RATE_THRESHOLD") {
        config.detection.error_rate_threshold = parse_env("ERROR_RATE_THRESHOLD", &raw)?;
    }
    if let Some(raw) = get("WINDOW_SIZE") {
        config.detection.window_size = parse_env("WINDOW_SIZE", &raw)?;
    }
    if let Some(raw) = get("ALERT_COOLDOWN_SEC") {
        config.alerts.cooldown_secs = parse_env("ALERT_COOLDOWN_SEC", &raw)?;
    }
    if let Some(raw) = get("MAINTENANCE_MODE") {
        config.alerts.maintenance_mode = parse_flag("MAINTENANCE_MODE", &raw)?;
    }

    Ok(())
}

fn parse_env<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = load_config_with(
            None,
            env_of(&[
                ("SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/T/B/X"),
                ("ACTIVE_POOL", "green"),
                ("ERROR_RATE_THRESHOLD", "5.5"),
                ("WINDOW_SIZE", "50"),
                ("ALERT_COOLDOWN_SEC", "60"),
                ("MAINTENANCE_MODE", "True"),
            ]),
        )
        .unwrap();

        assert_eq!(config.detection.initial_pool.as_deref(), Some("green"));
        assert_eq!(config.detection.error_rate_threshold, 5.5);
        assert_eq!(config.detection.window_size, 50);
        assert_eq!(config.alerts.cooldown_secs, 60);
        assert!(config.alerts.maintenance_mode);
        assert!(config.alerts.webhook_url.is_some());
    }

    #[test]
    fn test_unparsable_env_is_fatal() {
        let err = load_config_with(None, env_of(&[("WINDOW_SIZE", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "WINDOW_SIZE", .. }));

        let err = load_config_with(None, env_of(&[("MAINTENANCE_MODE", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("MAINTENANCE_MODE"));
    }

    #[test]
    fn test_out_of_range_env_fails_validation() {
        let err = load_config_with(None, env_of(&[("ERROR_RATE_THRESHOLD", "-1")])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors[0].field, "detection.error_rate_threshold")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[source]\npath = \"/tmp/access.log\"\n\n[alerts]\ncooldown_secs = 10\n"
        )
        .unwrap();

        let config =
            load_config_with(Some(file.path()), env_of(&[("ALERT_COOLDOWN_SEC", "20")])).unwrap();
        assert_eq!(config.source.path, "/tmp/access.log");
        assert_eq!(config.alerts.cooldown_secs, 20);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config_with(Some(Path::new("/nonexistent/watcher.toml")), env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
