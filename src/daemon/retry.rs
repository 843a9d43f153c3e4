// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Delay computation for the reconnect loop

use std::time::Duration;

use crate::config::{RetryConfig, RetryStrategy};

/// Reconnect delay policy.
///
/// `failures` passed to [`RetryPolicy::delay_for`] counts consecutive failed
/// attempts, starting at 1 for the first failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Same delay after every failure, no attempt limit.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            max_attempts: None,
        }
    }

    /// `base * multiplier^(failures - 1)`, capped at `max`.
    pub fn exponential(base: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            base_delay: base,
            max_delay: max.max(base),
            multiplier: multiplier.max(1.0),
            max_attempts: None,
        }
    }

    /// Give up after `attempts` consecutive failures.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Delay to wait after the `failures`-th consecutive failure, or `None`
    /// when the policy is exhausted.
    pub fn delay_for(&self, failures: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if failures >= max {
                return None;
            }
        }

        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Some(Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let base = Duration::from_secs(config.delay_secs);
        let policy = match config.strategy {
            RetryStrategy::Fixed => Self::fixed(base),
            RetryStrategy::Exponential => Self::exponential(
                base,
                Duration::from_secs(config.max_delay_secs),
                config.multiplier,
            ),
        };
        match config.max_attempts {
            Some(attempts) => policy.with_max_attempts(attempts),
            None => policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_five_seconds_forever() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for(1_000), Some(Duration::from_secs(5)));
        assert_eq!(policy.max_attempts(), None);
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let policy =
            RetryPolicy::exponential(Duration::from_secs(1), Duration::from_secs(10), 2.0);
        let delays: Vec<u64> = (1..=6)
            .filter_map(|n| policy.delay_for(n))
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
        assert_eq!(policy.delay_for(u32::MAX), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_max_attempts() {
        let policy = RetryPolicy::fixed(Duration::from_secs(5)).with_max_attempts(3);
        assert!(policy.delay_for(1).is_some());
        assert!(policy.delay_for(2).is_some());
        assert!(policy.delay_for(3).is_none());
    }

    #[test]
    fn test_from_config() {
        assert_eq!(
            RetryPolicy::from(&RetryConfig::default()),
            RetryPolicy::default()
        );

        let config = RetryConfig {
            strategy: RetryStrategy::Exponential,
            delay_secs: 2,
            max_delay_secs: 30,
            multiplier: 3.0,
            max_attempts: Some(4),
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(6)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(18)));
        assert_eq!(policy.delay_for(4), None);
    }
}
