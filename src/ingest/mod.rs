//! Channel feed ingestion.
//!
//! ```text
//! channel reference → resolve id → feed URL → fetch → Normalizer → ChannelFeed
//! ```
//!
//! Resolution failures surface as [`MonitorError::Resolve`], feed failures as
//! [`MonitorError::FeedFetch`].

pub mod resolver;

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::{MonitorError, Result};
use crate::domain::ChannelFeed;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

pub use resolver::{
    build_feed_url, build_feed_url_with, is_channel_id, parse_channel_ref, scan_channel_id,
    ChannelRef, DEFAULT_FEED_BASE, DEFAULT_SITE_BASE,
};

pub struct FeedIngestor {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    site_base: String,
    feed_base: String,
}

impl FeedIngestor {
    /// `site_base` serves channel pages; `feed_base` is the feed endpoint.
    pub fn with_bases(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        site_base: &str,
        feed_base: &str,
    ) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
            site_base: site_base.to_string(),
            feed_base: feed_base.to_string(),
        }
    }

    /// Turn a channel URL or handle into a channel id. Direct-id references
    /// return without a network call; handles fetch the channel page and
    /// scan it. No match is a `NotFound` failure.
    pub async fn resolve_channel_identifier(&self, reference: &str) -> Result<String> {
        self.resolve_inner(reference)
            .await
            .map_err(|e| MonitorError::resolve(reference, e))
    }

    async fn resolve_inner(&self, reference: &str) -> Result<String> {
        match parse_channel_ref(reference, &self.site_base)? {
            ChannelRef::Id(id) => Ok(id),
            ChannelRef::Page(page) => {
                debug!("Resolving channel id from {}", page);
                let document = self.fetcher.fetch_text(&page).await?;
                scan_channel_id(&document).ok_or(MonitorError::NotFound(page))
            }
        }
    }

    pub fn feed_url(&self, identifier: &str) -> Result<String> {
        build_feed_url_with(&self.feed_base, identifier)
    }

    /// Fetch and parse the feed for a resolved channel id.
    pub async fn fetch_feed(&self, identifier: &str) -> Result<ChannelFeed> {
        self.fetch_feed_inner(identifier)
            .await
            .map_err(|e| MonitorError::feed_fetch(identifier, e))
    }

    async fn fetch_feed_inner(&self, identifier: &str) -> Result<ChannelFeed> {
        let url = self.feed_url(identifier)?;
        let body = self.fetcher.fetch_text(&url).await?;
        let feed = self.normalizer.normalize(body.as_bytes())?;
        info!(
            "Fetched {} items from {} ({})",
            feed.items.len(),
            feed.channel_name,
            identifier
        );
        Ok(feed)
    }

    /// Resolve then fetch, keeping the two failure kinds apart.
    pub async fn fetch_channel(&self, reference: &str) -> Result<ChannelFeed> {
        let identifier = self.resolve_channel_identifier(reference).await?;
        self.fetch_feed(&identifier).await
    }
}
