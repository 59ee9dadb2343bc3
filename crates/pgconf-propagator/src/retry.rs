// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bounded retry with backoff for network-facing operations.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retry policy applied around coordinator requests.
///
/// Every failed attempt except the last is logged and followed by a sleep of
/// the current delay, after which the delay is multiplied by
/// `backoff_factor`. The last attempt runs unguarded and its error is
/// returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts. Zero or negative retries forever.
    pub max_attempts: i32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: i32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_factor,
        }
    }

    /// Policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    /// Whether this policy never gives up on its own.
    pub fn is_unlimited(&self) -> bool {
        self.max_attempts <= 0
    }

    /// Run `op` under this policy.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut remaining = self.max_attempts;
        let mut delay = self.initial_delay;

        while self.is_unlimited() || remaining > 1 {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        operation,
                        error = %e,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Error occurred during execution, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    remaining = remaining.saturating_sub(1);
                    delay = Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_factor)
                        .unwrap_or(Duration::MAX);
                }
            }
        }

        op().await
    }
}
