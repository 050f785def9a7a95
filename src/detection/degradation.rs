//! Error-rate degradation state machine.
//!
//! # State Transitions
//! ```text
//! Normal   → Degraded: rate >  threshold
//! Degraded → Normal:   rate <= threshold
//! ```
//!
//! Entering is the stricter test: a rate exactly at the threshold never
//! degrades, but it does clear an existing degradation.

use crate::detection::event::{ErrorRateSnapshot, MonitorEvent};
use crate::detection::window::SlidingWindow;

#[derive(Debug, Clone)]
pub struct DegradationTracker {
    threshold: f64,
    min_samples: usize,
    degraded: bool,
}

impl DegradationTracker {
    pub fn new(threshold: f64, min_samples: usize) -> Self {
        Self {
            threshold,
            min_samples,
            degraded: false,
        }
    }

    /// Re-evaluate after the window has been updated.
    pub fn evaluate(&mut self, window: &SlidingWindow) -> Option<MonitorEvent> {
        if window.len() < self.min_samples {
            return None;
        }

        let rate = window.error_rate();
        let snapshot = ErrorRateSnapshot {
            rate,
            threshold: self.threshold,
            errors: window.error_count(),
            samples: window.len(),
        };

        if rate > self.threshold && !self.degraded {
            self.degraded = true;
            Some(MonitorEvent::HighErrorRate(snapshot))
        } else if rate <= self.threshold && self.degraded {
            self.degraded = false;
            Some(MonitorEvent::ErrorRateRecovered(snapshot))
        } else {
            None
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}
