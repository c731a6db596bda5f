//! Bounded retry with exponential backoff and jitter.
//!
//! Used around the subscription save request: the operation is wrapped in a
//! plain loop instead of a retrying transmitter type, so any `send` can be
//! retried the same way.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently to retry a failed operation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retries.
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for every further retry.
    pub initial_backoff_ms: u64,
    /// Cap on the exponential delay.
    pub max_backoff_ms: u64,
    /// Random extra delay in `[0, jitter_ms]` added to each wait.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), without jitter.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::random_range(0..=self.jitter_ms)
        };
        self.backoff_for(retry)
            .saturating_add(Duration::from_millis(jitter))
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// `is_transient` decides whether an error is worth another attempt. The
/// last error is returned when giving up.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    log::info!("[Retry] {} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                let wait = policy.delay_for(attempt);
                log::warn!(
                    "[Retry] {} attempt {}/{} failed: {}; retrying in {:.1}s",
                    label,
                    attempt,
                    max_attempts,
                    e,
                    wait.as_secs_f32()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    log::error!("[Retry] {} gave up after {} attempts: {}", label, attempt, e);
                }
                return Err(e);
            }
        }
    }
}
