use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::app::{MonitorError, Result};
use crate::fetcher::{retry_with_backoff, FetchConfig, Fetcher, RateLimiter, RetryPolicy};

/// reqwest-backed fetcher. Every attempt passes through the shared rate
/// limiter; 429 responses trigger the policy's cooldown before the next attempt.
pub struct HttpFetcher {
    client: Client,
    limiter: RateLimiter,
    policy: RetryPolicy,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig, limiter: RateLimiter) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            limiter,
            policy: config.retry_policy(),
            timeout: config.request_timeout(),
        })
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        self.limiter.enforce().await;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::from_status(status.as_u16(), url));
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> MonitorError {
        if err.is_timeout() {
            MonitorError::Timeout(self.timeout)
        } else {
            MonitorError::Http(err)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        retry_with_backoff(&self.policy, || self.get_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> FetchConfig {
        FetchConfig {
            min_interval_ms: 0,
            request_timeout_secs: 2,
            retry_delays_ms: vec![5],
            max_attempts: 3,
            rate_limit_cooldown_secs: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&fast_config(), RateLimiter::unlimited()).unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&fast_config(), RateLimiter::unlimited()).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_budget_spent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&fast_config(), RateLimiter::unlimited()).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Status(503)));
    }

    #[tokio::test]
    async fn test_rate_limited_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&fast_config(), RateLimiter::unlimited()).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/busy", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_rate_limited_final_attempt_does_not_cool_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let config = FetchConfig {
            max_attempts: 1,
            rate_limit_cooldown_secs: 30,
            ..fast_config()
        };
        let fetcher = HttpFetcher::new(&config, RateLimiter::unlimited()).unwrap();

        let start = std::time::Instant::now();
        let err = fetcher
            .fetch_text(&format!("{}/busy", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_slow_response_surfaces_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = FetchConfig {
            request_timeout_secs: 1,
            max_attempts: 1,
            ..fast_config()
        };
        let fetcher = HttpFetcher::new(&config, RateLimiter::unlimited()).unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
