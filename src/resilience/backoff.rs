//! Exponential backoff for reconnect attempts.

use std::time::Duration;

use crate::config::BackoffConfig;

/// Calculate the delay before retry number `attempt` (1-based).
///
/// `base * multiplier^(attempt - 1)`, clamped to `max`.
pub fn calculate_backoff(attempt: u32, base: Duration, multiplier: f64, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = multiplier.max(1.0).powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32);
    let delay_nanos = (base.as_nanos() as f64 * factor).round();
    if !delay_nanos.is_finite() || delay_nanos >= max.as_nanos() as f64 {
        return max;
    }
    Duration::from_nanos(delay_nanos as u64).min(max)
}

/// Retry policy that never gives up.
///
/// Each call to [`next_delay`](Self::next_delay) counts one consecutive
/// failure; [`reset`](Self::reset) after a success starts over at the base.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: f64,
    max: Duration,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            base,
            multiplier,
            max: max.max(base),
            attempt: 0,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_interval_ms),
            config.multiplier,
            Duration::from_millis(config.max_interval_ms),
        )
    }

    /// Delay to wait after the current failure.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        calculate_backoff(self.attempt, self.base, self.multiplier, self.max)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
