//! Access log record decoding.
//!
//! One JSON object per line, as written by the proxy's `json` log format.
//! Numeric fields are decoded leniently: the proxy writes `"-"` for values
//! it does not have, and some formats quote numbers. Anything unusable
//! falls back to zero rather than rejecting the whole record.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors produced while decoding a log line.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The line is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The line is JSON but not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// One proxied request, as seen in the access log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: String,
    pub remote_addr: String,
    pub request: String,
    /// Final status returned to the client (0 when unparsable).
    pub status: u16,
    pub body_bytes_sent: u64,
    /// Total request time in seconds.
    pub request_time: f64,
    pub upstream_addr: String,
    /// One status per upstream attempt, in order. Never empty.
    pub upstream_status: Vec<u16>,
    /// Response time per upstream attempt, parallel to `upstream_status`.
    pub upstream_response_time: Vec<Option<f64>>,
    /// Serving pool label. `None` when absent or empty.
    pub pool: Option<String>,
    pub release: Option<String>,
}

impl LogRecord {
    /// True when the client saw a 5xx or any upstream attempt returned one.
    ///
    /// A request that only succeeded after a retry against the backup pool
    /// still counts as an error.
    pub fn is_error(&self) -> bool {
        self.status >= 500 || self.upstream_status.iter().any(|&code| code >= 500)
    }

    /// Number of upstream attempts beyond the first.
    pub fn retries(&self) -> usize {
        self.upstream_status.len().saturating_sub(1)
    }

    /// The record timestamp, when it is valid ISO-8601.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.timestamp.trim()).ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    timestamp: Value,
    remote_addr: Value,
    request: Value,
    status: Value,
    body_bytes_sent: Value,
    request_time: Value,
    upstream_addr: Value,
    upstream_status: Value,
    upstream_response_time: Value,
    pool: Value,
    release: Value,
}

/// Decode one log line.
pub fn parse_line(line: &str) -> Result<LogRecord, ParseError> {
    let value: Value = serde_json::from_str(line.trim())?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject(json_kind(&value)));
    }
    let raw: RawRecord = serde_json::from_value(value)?;

    let status = as_u16(&raw.status);
    let mut upstream_status: Vec<u16> = split_list(&raw.upstream_status)
        .iter()
        .map(|token| {
            parse_u64(token)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(0)
        })
        .collect();
    if upstream_status.is_empty() {
        upstream_status.push(status);
    }

    Ok(LogRecord {
        timestamp: as_string(&raw.timestamp),
        remote_addr: as_string(&raw.remote_addr),
        request: as_string(&raw.request),
        status,
        body_bytes_sent: as_u64(&raw.body_bytes_sent),
        request_time: as_f64(&raw.request_time),
        upstream_addr: as_string(&raw.upstream_addr),
        upstream_status,
        upstream_response_time: split_list(&raw.upstream_response_time)
            .iter()
            .map(|token| token.parse().ok())
            .collect(),
        pool: non_empty(&raw.pool),
        release: non_empty(&raw.release),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn non_empty(value: &Value) -> Option<String> {
    let s = as_string(value);
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn as_u64(value: &Value) -> u64 {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => parse_u64(s),
        _ => None,
    };
    parsed.unwrap_or(0)
}

fn parse_u64(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    raw.parse()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(integral))
}

/// `502.0` is a status code; `502.5` and `-1.0` are not.
fn integral(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

fn as_u16(value: &Value) -> u16 {
    u16::try_from(as_u64(value)).unwrap_or(0)
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Split a proxy multi-value field ("502, 200" or "502, 504 : 200").
fn split_list(value: &Value) -> Vec<String> {
    let joined = match value {
        Value::Array(items) => items.iter().map(as_string).collect::<Vec<_>>().join(","),
        other => as_string(other),
    };
    joined
        .split(|c: char| c == ',' || c == ':' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
