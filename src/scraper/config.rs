use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::RetryPolicy;

/// Configuration for the browser-driven scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Page load timeout in seconds (default: 30)
    pub navigation_timeout_secs: u64,

    /// How long to wait for the content-ready marker, in seconds (default: 10)
    pub content_wait_secs: u64,

    /// Polling interval while waiting for a marker, in milliseconds (default: 250)
    pub poll_interval_ms: u64,

    /// Fixed viewport so pages render the same layout every run
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Stable user agent string (consistency, not disguise)
    pub user_agent: String,

    /// Element whose presence means the content has rendered
    pub content_selector: String,

    /// Elements that indicate the site is showing a login wall instead of content
    pub login_wall_selectors: Vec<String>,

    /// Whole-session attempts per target (default: 3)
    pub max_attempts: usize,

    /// Backoff schedule between session attempts, in milliseconds
    pub retry_delays_ms: Vec<u64>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout_secs: 30,
            content_wait_secs: 10,
            poll_interval_ms: 250,
            viewport_width: 1280,
            viewport_height: 900,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            content_selector: r#"article[data-testid="tweet"]"#.to_string(),
            login_wall_selectors: vec![
                r#"[data-testid="sheetDialog"]"#.to_string(),
                r#"[data-testid="loginButton"]"#.to_string(),
                r#"a[href="/login"]"#.to_string(),
                r#"form[action*="login"]"#.to_string(),
            ],
            max_attempts: 3,
            retry_delays_ms: vec![2000, 5000],
        }
    }
}

impl ScraperConfig {
    /// Get the page load timeout as a Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Get the content-marker wait as a Duration
    pub fn content_wait(&self) -> Duration {
        Duration::from_secs(self.content_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(&self.retry_delays_ms, self.max_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ScraperConfig::default();
        assert!(config.headless);
        assert_eq!(config.navigation_timeout_secs, 30);
        assert_eq!(config.content_wait_secs, 10);
        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.max_attempts, 3);
        assert!(!config.login_wall_selectors.is_empty());
        assert!(!config.content_selector.is_empty());
    }

    #[test]
    fn test_durations() {
        let config = ScraperConfig::default();
        assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.content_wait(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));

        let zero = ScraperConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(zero.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_partial_toml() {
        let config: ScraperConfig = toml::from_str("content_wait_secs = 3\nheadless = false").unwrap();
        assert_eq!(config.content_wait_secs, 3);
        assert!(!config.headless);
        assert_eq!(config.navigation_timeout_secs, 30);
    }
}
