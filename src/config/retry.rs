// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-opcua-logger project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Reconnect policy configuration
//!
//! The default reproduces the classic behavior of the logger: wait 5 seconds
//! after any failure and try again, forever. An exponential backoff and an
//! attempt limit can be enabled instead.

use serde::{Deserialize, Serialize};

/// Delay growth strategy between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// Constant `delay_secs` between attempts.
    #[default]
    Fixed,
    /// `delay_secs * multiplier^(n-1)`, capped at `max_delay_secs`.
    Exponential,
}

/// Reconnect loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub strategy: RetryStrategy,

    /// Delay after a failure, in seconds. Initial delay for `exponential`.
    pub delay_secs: u64,

    /// Upper bound of the exponential delay, in seconds.
    pub max_delay_secs: u64,

    /// Growth factor of the exponential delay. Must be >= 1.0.
    pub multiplier: f64,

    /// Stop after this many consecutive failures. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Fixed,
            delay_secs: 5,
            max_delay_secs: 300,
            multiplier: 2.0,
            max_attempts: None,
        }
    }
}
