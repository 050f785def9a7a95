//! Outbound alert delivery.
//!
//! # Responsibilities
//! - Encode an alert into the channel's wire format
//! - Perform exactly one send per alert
//!
//! # Design Decisions
//! - Failures are returned to the worker, which logs and drops them
//! - No retries: a late duplicate page is worse than a missed one
//! - Without an endpoint, alerts are written to the local log instead

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::alerting::alert::{Alert, Severity};
use crate::config::AlertConfig;

/// Errors from a single delivery attempt.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid webhook endpoint: {0}")]
    InvalidEndpoint(String),
}

/// A notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert. Called at most once per alert.
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError>;

    /// Channel name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Slack-compatible incoming webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl WebhookNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| NotifyError::InvalidEndpoint(e.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// Attachment message for one alert.
    pub fn payload(alert: &Alert) -> Value {
        json!({
            "attachments": [{
                "color": alert.severity().color(),
                "title": alert.title(),
                "text": alert.body(),
                "footer": alert.footer(),
            }]
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&Self::payload(alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Writes alerts to the local log. Used when no endpoint is configured.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        match alert.severity() {
            Severity::Info | Severity::Resolved => tracing::info!(
                kind = alert.kind().as_str(),
                title = alert.title(),
                "{}",
                alert.body()
            ),
            Severity::Warning | Severity::Critical => tracing::warn!(
                kind = alert.kind().as_str(),
                title = alert.title(),
                "{}",
                alert.body()
            ),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Pick the channel for the configured endpoint.
pub fn build_notifier(config: &AlertConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(
            url,
            Duration::from_secs(config.request_timeout_secs),
        )?)),
        None => {
            tracing::warn!("No webhook configured - alerts will be written to the local log only");
            Ok(Arc::new(ConsoleNotifier))
        }
    }
}
