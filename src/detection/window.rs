//! Bounded FIFO of request outcomes.

use std::collections::VecDeque;

/// Sliding window over the most recent `capacity` request outcomes.
///
/// The error rate is computed over the current occupancy, so a window that
/// has not filled yet is not diluted by empty slots.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    outcomes: VecDeque<bool>,
    errors: usize,
}

impl SlidingWindow {
    /// Create a window holding at most `capacity` outcomes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            outcomes: VecDeque::with_capacity(capacity.min(4096)),
            errors: 0,
        }
    }

    /// Record one outcome, evicting the oldest once full.
    pub fn push(&mut self, is_error: bool) {
        if self.outcomes.len() == self.capacity {
            if let Some(true) = self.outcomes.pop_front() {
                self.errors -= 1;
            }
        }
        self.outcomes.push_back(is_error);
        if is_error {
            self.errors += 1;
        }
    }

    /// Error percentage over current occupancy; 0.0 when empty.
    pub fn error_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        // Multiply first so boundary rates (e.g. 1/5) compare exactly.
        (self.errors as f64 * 100.0) / self.outcomes.len() as f64
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
