//! Events raised by the trackers.

/// A state change worth alerting on.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Traffic moved away from the primary pool (or between backups).
    Failover { from: String, to: String },

    /// Traffic returned to the primary pool.
    PoolRecovered { from: String, to: String },

    /// Error rate crossed above the threshold.
    HighErrorRate(ErrorRateSnapshot),

    /// Error rate fell back to or below the threshold.
    ErrorRateRecovered(ErrorRateSnapshot),
}

/// Window figures captured at the moment of a degradation change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRateSnapshot {
    pub rate: f64,
    pub threshold: f64,
    pub errors: usize,
    pub samples: usize,
}
