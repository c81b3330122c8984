//! Bounded retry with exponential backoff.
//!
//! Transient failures (connect errors, timeouts, HTTP 429 and 5xx) are
//! retried up to a fixed attempt budget with exponentially growing delays.
//! Every other HTTP status fails on the first attempt.

use std::time::Duration;

/// Retry policy for chat completion calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempt budget, including the first call (1 = no retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling on the backoff schedule.
    pub max_delay: Duration,
    /// Backoff multiplier (2.0 = doubling).
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with the given attempt budget. Uses default backoff.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given retry (0-indexed: the delay taken
    /// after the first failed attempt is `delay_for_attempt(0)`).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }

    /// Whether an HTTP status warrants another attempt. Rate limits and
    /// server-side failures are transient; everything else is not.
    pub fn retryable_status(&self, status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }
}
