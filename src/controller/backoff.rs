//! # Fibonacci Backoff
//!
//! Progressive retry delays for failed reconciliation passes.
//!
//! Delays grow along the Fibonacci sequence, more slowly than exponential
//! backoff, so a backing operator that is briefly unavailable is retried
//! promptly while a persistently failing declaration settles at the ceiling.
//!
//! The sequence is computed in minutes and returned in seconds:
//! 1m, 1m, 2m, 3m, 5m, 8m, 10m (max).
//!
//! ```rust
//! use infra_dependency_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 120);
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Floor in minutes, restored on reset
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    /// Ceiling in minutes
    max_minutes: u64,
}

impl FibonacciBackoff {
    /// Backoff starting at `min_minutes` and capped at `max_minutes`
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes * 60;

        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = std::cmp::min(next_minutes, self.max_minutes);

        result_seconds
    }

    /// Current delay as a [`Duration`]; advances the sequence
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Restart the sequence from the floor
    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}
