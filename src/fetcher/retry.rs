use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::app::MonitorError;

/// Failure classification consumed by [`retry_with_backoff`] and
/// [`handle_rate_limit_signal`].
pub trait Retryable {
    /// Whether the operation should be attempted again after this failure.
    fn is_retryable(&self) -> bool {
        true
    }

    /// Whether the failure is an upstream "slow down" signal.
    fn is_rate_limit(&self) -> bool {
        false
    }
}

impl Retryable for MonitorError {
    fn is_retryable(&self) -> bool {
        MonitorError::is_retryable(self)
    }

    fn is_rate_limit(&self) -> bool {
        MonitorError::is_rate_limit(self)
    }
}

/// Backoff schedule plus attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
    max_attempts: usize,
    rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
            3,
        )
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one invocation.
    pub fn new(delays: Vec<Duration>, max_attempts: usize) -> Self {
        Self {
            delays,
            max_attempts: max_attempts.max(1),
            rate_limit_cooldown: Duration::ZERO,
        }
    }

    /// Minimum wait before retrying after an upstream rate-limit signal.
    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        self.rate_limit_cooldown
    }

    pub fn from_millis(delays_ms: &[u64], max_attempts: usize) -> Self {
        Self::new(
            delays_ms.iter().copied().map(Duration::from_millis).collect(),
            max_attempts,
        )
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::new(Vec::new(), 1)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay to sleep after the failed attempt at `attempt` (0-based).
    /// Indices past the end of the schedule reuse the last delay.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.delays
            .get(attempt)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Run `operation` until it succeeds, the policy's attempt budget is spent,
/// or it fails with a non-retryable error.
///
/// The final failure is returned unchanged. No sleep happens after the last
/// attempt, not even the rate-limit cooldown. When another attempt follows a
/// rate-limit signal, the wait is the longer of the cooldown and the backoff
/// delay, never their sum.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let remaining = policy.max_attempts - attempt - 1;
                if remaining == 0 || !err.is_retryable() {
                    if attempt > 0 {
                        warn!("Giving up after {} attempts: {}", attempt + 1, err);
                    }
                    return Err(err);
                }

                let backoff = policy.delay_for(attempt);
                let cooldown = if err.is_rate_limit() {
                    policy.rate_limit_cooldown
                } else {
                    Duration::ZERO
                };
                debug!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt + 1,
                    policy.max_attempts,
                    err,
                    backoff.max(cooldown)
                );
                handle_rate_limit_signal(err, cooldown).await;
                tokio::time::sleep(backoff.saturating_sub(cooldown)).await;
                attempt += 1;
            }
        }
    }
}

/// Sleep for `cooldown` if `err` is an upstream rate-limit signal, then hand
/// the same error back so the surrounding retry loop can try again. Other
/// errors come back immediately.
pub async fn handle_rate_limit_signal<E: Retryable + Display>(err: E, cooldown: Duration) -> E {
    if err.is_rate_limit() {
        warn!("Rate limited ({}); cooling down for {:?}", err, cooldown);
        tokio::time::sleep(cooldown).await;
    }
    err
}
