//! Browser-driven scraping of rendered pages.
//!
//! Each attempt runs one fresh browser session through a fixed sequence:
//!
//! ```text
//! Idle → Launched → Navigated → Extracted → Closed
//!                ↘ LoginWallDetected → CookiesCleared → Navigated (once)
//! ```
//!
//! The session is closed on every exit path. Rate limiting and retries wrap
//! the whole attempt, so a retry never reuses a stale browser.
//!
//! # Usage
//!
//! ```rust,ignore
//! use watchpost::scraper::{ChromeLauncher, DomScraper, ScraperConfig};
//!
//! let scraper = DomScraper::new(ChromeLauncher, ScraperConfig::default(), limiter)?;
//! let records = scraper.scrape("https://x.com/rustlang").await?;
//! ```

mod chrome;
mod config;
mod extractor;
mod session;

pub use chrome::ChromeLauncher;
pub use config::ScraperConfig;
pub use extractor::ContentExtractor;
pub use session::{BrowserSession, SessionLauncher};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::{MonitorError, Result};
use crate::domain::ExtractedRecord;
use crate::fetcher::{retry_with_backoff, RateLimiter, RetryPolicy};

/// Lifecycle states of one scrape attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Idle,
    Launched,
    Navigated,
    LoginWallDetected,
    CookiesCleared,
    Extracted,
    Closed,
}

/// Trait for page scraping implementations
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scrape all records from `url`, retrying whole sessions on failure.
    async fn scrape(&self, url: &str) -> Result<Vec<ExtractedRecord>>;
}

pub struct DomScraper<L: SessionLauncher> {
    launcher: L,
    config: ScraperConfig,
    extractor: ContentExtractor,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl<L: SessionLauncher> DomScraper<L> {
    pub fn new(launcher: L, config: ScraperConfig, limiter: RateLimiter) -> Result<Self> {
        let policy = config.retry_policy();
        Ok(Self {
            launcher,
            config,
            extractor: ContentExtractor::new()?,
            limiter,
            policy,
        })
    }

    /// One full session: launch, navigate (with at most one login-wall
    /// mitigation), extract, and always close.
    pub async fn scrape_once(&self, url: &str) -> Result<Vec<ExtractedRecord>> {
        let mut session = self.launcher.launch(&self.config).await?;
        let mut state = ScrapeState::Launched;
        debug!("{:?}: {}", state, url);

        let result = self.drive(session.as_mut(), url, &mut state).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session for {}: {}", url, e);
        }
        debug!("{:?} after {:?}: {}", ScrapeState::Closed, state, url);

        result
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        state: &mut ScrapeState,
    ) -> Result<Vec<ExtractedRecord>> {
        self.navigate(session, url, state).await?;

        let html = session.content().await?;
        let base = Url::parse(url).ok();
        let records = self.extractor.extract(&html, base.as_ref());
        *state = ScrapeState::Extracted;

        info!("Extracted {} records from {}", records.len(), url);
        Ok(records)
    }

    async fn navigate(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        state: &mut ScrapeState,
    ) -> Result<()> {
        let content = &self.config.content_selector;
        let wait = self.config.content_wait();

        session.goto(url, self.config.navigation_timeout()).await?;
        if session.wait_for(content, wait).await? {
            *state = ScrapeState::Navigated;
            return Ok(());
        }

        if !self.login_wall_present(session).await? {
            return Err(MonitorError::Timeout(wait));
        }

        *state = ScrapeState::LoginWallDetected;
        warn!("Login wall on {}; clearing cookies and reloading", url);

        session.clear_cookies().await?;
        *state = ScrapeState::CookiesCleared;

        session.reload(self.config.navigation_timeout()).await?;
        if session.wait_for(content, wait).await? {
            *state = ScrapeState::Navigated;
            return Ok(());
        }

        // Exactly one mitigation per attempt
        if self.login_wall_present(session).await? {
            Err(MonitorError::LoginWall)
        } else {
            Err(MonitorError::Timeout(wait))
        }
    }

    async fn login_wall_present(&self, session: &mut dyn BrowserSession) -> Result<bool> {
        for selector in &self.config.login_wall_selectors {
            if session.has_element(selector).await? {
                debug!("Login wall marker matched: {}", selector);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl<L: SessionLauncher> Scraper for DomScraper<L> {
    async fn scrape(&self, url: &str) -> Result<Vec<ExtractedRecord>> {
        retry_with_backoff(&self.policy, || async move {
            self.limiter.enforce().await;
            self.scrape_once(url).await
        })
        .await
        .map_err(|e| MonitorError::scrape(url, e))
    }
}
