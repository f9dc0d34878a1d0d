pub mod config;
pub mod http_fetcher;
pub mod rate_limit;
pub mod retry;

use async_trait::async_trait;

use crate::app::Result;

pub use config::FetchConfig;
pub use http_fetcher::HttpFetcher;
pub use rate_limit::RateLimiter;
pub use retry::{handle_rate_limit_signal, retry_with_backoff, RetryPolicy, Retryable};

#[async_trait]
pub trait Fetcher {
    /// GET `url` and return the body as text, with rate limiting and retries
    /// already applied.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}
