//! Serving pool transition tracking.
//!
//! # State Transitions
//! ```text
//! unset  → baseline: first pool becomes both last and initial pool
//! last → other (other != initial): Failover(last → other)
//! last → initial:                  PoolRecovered(last → initial)
//! last → last:                     nothing
//! ```
//!
//! Purely observational: the tracker knows pool identity from the log, not
//! which pool is healthy.

use crate::detection::event::MonitorEvent;

#[derive(Debug, Clone, Default)]
pub struct PoolTracker {
    initial_pool: Option<String>,
    last_pool: Option<String>,
}

impl PoolTracker {
    /// Start with a known primary pool, or capture it from the first record.
    pub fn new(initial_pool: Option<String>) -> Self {
        Self {
            last_pool: initial_pool.clone(),
            initial_pool,
        }
    }

    /// Observe the pool that served one request.
    pub fn observe(&mut self, pool: &str) -> Option<MonitorEvent> {
        if pool.is_empty() {
            return None;
        }

        let Some(last) = self.last_pool.as_deref() else {
            tracing::info!(pool = %pool, "Baseline pool captured");
            self.initial_pool = Some(pool.to_string());
            self.last_pool = Some(pool.to_string());
            return None;
        };

        if last == pool {
            return None;
        }

        let from = last.to_string();
        let to = pool.to_string();
        let event = if self.initial_pool.as_deref() == Some(pool) {
            MonitorEvent::PoolRecovered { from, to }
        } else {
            MonitorEvent::Failover { from, to }
        };
        self.last_pool = Some(pool.to_string());
        Some(event)
    }

    pub fn initial_pool(&self) -> Option<&str> {
        self.initial_pool.as_deref()
    }

    pub fn current_pool(&self) -> Option<&str> {
        self.last_pool.as_deref()
    }
}
