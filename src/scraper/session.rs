use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;
use crate::scraper::ScraperConfig;

/// One isolated browser context driven through a single scrape attempt.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`, failing if navigation does not finish within `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Poll for `selector` until it appears (`true`) or `timeout` passes (`false`).
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Whether `selector` matches anything right now.
    async fn has_element(&mut self, selector: &str) -> Result<bool>;

    async fn clear_cookies(&mut self) -> Result<()>;

    async fn reload(&mut self, timeout: Duration) -> Result<()>;

    /// Snapshot of the rendered document.
    async fn content(&mut self) -> Result<String>;

    /// Release the browser. Must be safe to call after any failure.
    async fn close(&mut self) -> Result<()>;
}

/// Starts fresh sessions; each scrape attempt gets a brand-new one.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, config: &ScraperConfig) -> Result<Box<dyn BrowserSession>>;
}
