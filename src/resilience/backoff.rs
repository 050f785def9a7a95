//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::SourceConfig;

/// Retry schedule for reopening the log source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_ms: u64,
    pub max_ms: u64,
    pub max_attempts: u32,
}

impl Backoff {
    pub fn from_source(config: &SourceConfig) -> Self {
        Self {
            base_ms: config.open_base_delay_ms,
            max_ms: config.open_max_delay_ms,
            max_attempts: config.open_max_attempts,
        }
    }

    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// attempts are used up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(calculate_backoff(attempt, self.base_ms, self.max_ms))
    }
}

/// Calculate exponential backoff delay with up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponent = (attempt - 1).min(63);
    let capped = base_ms.saturating_mul(1u64 << exponent).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
