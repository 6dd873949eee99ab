//! Retry budget with optional exponential backoff for profile loads.

use std::time::Duration;

use super::delay::secs;
use crate::config::TimingConfig;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (1.0 keeps the delay fixed)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryConfig {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            max_attempts: timing.max_attempts.max(1),
            initial_delay: secs(timing.retry_delay_secs),
            backoff_multiplier: timing.backoff_multiplier,
            ..Self::default()
        }
    }

    /// A budget of `max_attempts` with no delay between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Whether another attempt may follow the given (1-based) failed attempt
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.backoff_multiplier <= 1.0 {
            return self.initial_delay;
        }

        let exp_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt as f64 - 1.0);
        let delay_secs = exp_delay.min(self.max_delay.as_secs_f64());
        secs(delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        let config = RetryConfig::default();
        assert!(config.allows_retry_after(1));
        assert!(config.allows_retry_after(2));
        assert!(!config.allows_retry_after(3));
    }

    #[test]
    fn test_constant_delay() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_after(1), Duration::from_secs(5));
        assert_eq!(config.delay_after(2), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let config = RetryConfig {
            max_attempts: 6,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        };

        assert_eq!(config.delay_after(1), Duration::from_secs(2));
        assert_eq!(config.delay_after(2), Duration::from_secs(4));
        assert_eq!(config.delay_after(3), Duration::from_secs(8));
        assert_eq!(config.delay_after(4), Duration::from_secs(10));
    }

    #[test]
    fn test_from_timing_never_zero_attempts() {
        let timing = TimingConfig {
            max_attempts: 0,
            retry_delay_secs: 0.25,
            ..TimingConfig::default()
        };
        let config = RetryConfig::from_timing(&timing);

        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.initial_delay, Duration::from_millis(250));
        assert!(!config.allows_retry_after(1));
    }

    #[test]
    fn test_immediate() {
        let config = RetryConfig::immediate(3);
        assert_eq!(config.delay_after(2), Duration::ZERO);
        assert_eq!(config.max_attempts, 3);
    }
}
