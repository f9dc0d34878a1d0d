//! # Watchpost
//!
//! Monitors video channels and rendered social pages for new content.
//!
//! ## Architecture
//!
//! ```text
//!               ┌→ ingest (resolve → feed URL → fetch) → normalizer ┐
//! targets → ────┤                                                   ├→ store (hash check)
//!               └→ scraper (browser session → extractor) ───────────┘
//! ```
//!
//! Every outbound request goes through one shared rate limiter and a
//! retry-with-backoff executor. The change-detection cache is a single JSON
//! file keyed by source URL.
//!
//! ## Quick Start
//!
//! ```bash
//! # Resolve a handle and list the newest uploads
//! watchpost feed https://www.youtube.com/@rustlang --limit 5
//!
//! # Record a hash and learn whether the content changed
//! watchpost check https://example.com/page "$(watchpost hash page.html)"
//!
//! # Check every configured target once
//! watchpost run
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store, the
/// fetcher, the feed ingestor and the scraper.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// TOML configuration loaded from `~/.config/watchpost/config.toml`.
pub mod config;

/// Plain data types: cache entries, feed items, scraped records, targets.
pub mod domain;

/// Outbound HTTP with a shared rate limiter and retry-with-backoff.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for text fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`RateLimiter`](fetcher::RateLimiter): process-wide minimum spacing
pub mod fetcher;

/// Channel identifier resolution and feed retrieval.
pub mod ingest;

/// Feed document parsing into [`ChannelFeed`](domain::ChannelFeed).
///
/// Well-formed Atom goes through feed-rs; malformed documents fall back to a
/// tolerant entry scanner.
pub mod normalizer;

/// Browser-driven scraping of rendered pages.
///
/// - [`DomScraper`](scraper::DomScraper): session lifecycle with login-wall recovery
/// - [`ContentExtractor`](scraper::ContentExtractor): pure HTML → records
/// - [`ChromeLauncher`](scraper::ChromeLauncher): chromiumoxide-backed sessions
pub mod scraper;

/// Change-detection cache.
///
/// - [`ChangeStore`](store::ChangeStore): trait for cache operations
/// - [`JsonCacheStore`](store::JsonCacheStore): JSON file implementation
pub mod store;
