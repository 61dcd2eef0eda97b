//! Exponential backoff calculation

use std::time::Duration;

/// Exponential backoff: delay = initial_delay * base^(attempt-1), uncapped
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffCalculator {
    initial_delay: Duration,
    base: f64,
}

impl BackoffCalculator {
    pub fn new(initial_delay: Duration, base: f64) -> Self {
        Self {
            initial_delay,
            base,
        }
    }

    /// Doubling backoff starting at `initial_delay`
    pub fn doubling(initial_delay: Duration) -> Self {
        Self::new(initial_delay, 2.0)
    }

    /// Calculate delay for a specific attempt (1-indexed)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let multiplier = self
            .base
            .powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32);
        // float-to-int casts saturate, so huge attempts clamp instead of wrapping
        Duration::from_nanos((self.initial_delay.as_nanos() as f64 * multiplier) as u64)
    }
}
