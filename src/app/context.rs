use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{MonitorError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::{Fetcher, RateLimiter};
use crate::ingest::FeedIngestor;
use crate::scraper::{ChromeLauncher, DomScraper};
use crate::store::JsonCacheStore;

/// Everything one run needs, wired once from the loaded configuration.
///
/// The HTTP fetcher and the browser scraper share one [`RateLimiter`], so the
/// minimum spacing holds across both kinds of outbound request.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<JsonCacheStore>,
    pub ingestor: FeedIngestor,
    pub scraper: DomScraper<ChromeLauncher>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let cache_path = config
            .cache_path()
            .map_err(|e| MonitorError::Config(e.to_string()))?;
        Self::with_cache_path(config, cache_path)
    }

    pub fn with_cache_path(config: Config, cache_path: PathBuf) -> Result<Self> {
        let limiter = RateLimiter::new(config.fetch.min_interval());

        let store = Arc::new(JsonCacheStore::new(cache_path));
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(&config.fetch, limiter.clone())?);
        let ingestor =
            FeedIngestor::with_bases(fetcher, &config.feeds.site_base, &config.feeds.feed_base);
        let scraper = DomScraper::new(ChromeLauncher, config.scraper.clone(), limiter)?;

        Ok(Self {
            config,
            store,
            ingestor,
            scraper,
        })
    }
}
