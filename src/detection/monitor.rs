//! Monitor state owner.

use crate::config::DetectionConfig;
use crate::detection::degradation::DegradationTracker;
use crate::detection::event::MonitorEvent;
use crate::detection::pool::PoolTracker;
use crate::detection::window::SlidingWindow;
use crate::ingest::LogRecord;
use crate::observability::metrics;

/// All detection state for one log source.
///
/// Owned by the ingestion loop and mutated one record at a time; a record
/// either updates every tracker or none.
#[derive(Debug, Clone)]
pub struct Monitor {
    window: SlidingWindow,
    pools: PoolTracker,
    degradation: DegradationTracker,
    total_requests: u64,
    pool_changes: u64,
}

impl Monitor {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            window: SlidingWindow::new(config.window_size),
            pools: PoolTracker::new(config.initial_pool.clone()),
            degradation: DegradationTracker::new(
                config.error_rate_threshold,
                config.effective_min_samples(),
            ),
            total_requests: 0,
            pool_changes: 0,
        }
    }

    /// Feed one record through window, pool tracker and degradation tracker.
    ///
    /// Pool events come before degradation events.
    pub fn observe(&mut self, record: &LogRecord) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        self.total_requests += 1;
        self.window.push(record.is_error());

        if let Some(pool) = record.pool.as_deref() {
            if let Some(event) = self.pools.observe(pool) {
                self.pool_changes += 1;
                events.push(event);
            }
        }

        if let Some(event) = self.degradation.evaluate(&self.window) {
            events.push(event);
        }

        metrics::record_window(self.window.error_rate(), self.degradation.is_degraded());
        events
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn current_pool(&self) -> Option<&str> {
        self.pools.current_pool()
    }

    pub fn initial_pool(&self) -> Option<&str> {
        self.pools.initial_pool()
    }

    pub fn is_degraded(&self) -> bool {
        self.degradation.is_degraded()
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Failovers plus pool recoveries seen so far.
    pub fn pool_changes(&self) -> u64 {
        self.pool_changes
    }
}
