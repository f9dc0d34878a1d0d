use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::RetryPolicy;

/// Configuration for outbound HTTP requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Minimum spacing between any two requests in one run, in milliseconds (default: 2000)
    pub min_interval_ms: u64,

    /// Per-request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,

    /// Backoff schedule between attempts, in milliseconds
    pub retry_delays_ms: Vec<u64>,

    /// Total attempts including the first one (default: 3)
    pub max_attempts: usize,

    /// Pause after an HTTP 429 before the next attempt, in seconds (default: 60)
    pub rate_limit_cooldown_secs: u64,

    /// User agent string sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2000,
            request_timeout_secs: 10,
            retry_delays_ms: vec![1000, 2000, 4000],
            max_attempts: 3,
            rate_limit_cooldown_secs: 60,
            user_agent: concat!("watchpost/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(&self.retry_delays_ms, self.max_attempts)
            .with_rate_limit_cooldown(self.rate_limit_cooldown())
    }
}
