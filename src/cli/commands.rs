use std::fs;
use std::io::{self, Read};

use serde::Serialize;
use tracing::{info, warn};

use crate::app::{AppContext, MonitorError, Result};
use crate::domain::{
    by_priority, take_first, ChangeStatus, ExtractedRecord, FeedItem, Target, TargetKind,
};
use crate::scraper::Scraper;
use crate::store::{content_hash, ChangeStore};

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MonitorError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(())
}

pub fn check(store: &dyn ChangeStore, url: &str, hash: &str) -> Result<ChangeStatus> {
    require(url, "url")?;
    require(hash, "hash")?;

    let status = store.check(url, hash)?;
    println!("{}", status);
    Ok(status)
}

pub fn stats(store: &dyn ChangeStore) -> Result<()> {
    let stats = store.stats();

    println!("Entries:               {}", stats.total_entries);
    match stats.last_check {
        Some(at) => println!("Last check:            {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Last check:            never"),
    }
    println!("Changed on last check: {}", stats.changed_on_last_check);
    Ok(())
}

pub fn clear(store: &dyn ChangeStore) -> Result<()> {
    store.clear()?;
    println!("Cache cleared");
    Ok(())
}

pub fn remove(store: &dyn ChangeStore, url: &str) -> Result<()> {
    require(url, "url")?;

    if store.get(url).is_none() {
        println!("Not cached: {}", url);
        return Ok(());
    }
    store.remove(url)?;
    println!("Removed: {}", url);
    Ok(())
}

/// Hash a file, or stdin when `path` is "-".
pub fn hash(path: &str) -> Result<String> {
    require(path, "path")?;

    let content = if path == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        fs::read(path)?
    };

    let digest = content_hash(&content);
    println!("{}", digest);
    Ok(digest)
}

pub async fn resolve(ctx: &AppContext, channel: &str) -> Result<()> {
    require(channel, "channel")?;

    let id = ctx.ingestor.resolve_channel_identifier(channel).await?;
    println!("{}", id);
    Ok(())
}

pub async fn feed(ctx: &AppContext, channel: &str, limit: Option<usize>) -> Result<()> {
    require(channel, "channel")?;

    let feed = ctx.ingestor.fetch_channel(channel).await?;
    println!("{} ({} items)", feed.channel_name, feed.items.len());
    print_items(&take_first(feed.items, limit));
    Ok(())
}

pub async fn scrape(ctx: &AppContext, url: &str, limit: Option<usize>) -> Result<()> {
    require(url, "url")?;

    let records = ctx.scraper.scrape(url).await?;
    print_records(&take_first(records, limit));
    Ok(())
}

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub changed: usize,
    pub unchanged: usize,
    pub errors: usize,
}

/// Check every configured target once, highest priority first.
///
/// A target that fails, whether fetching it or recording its snapshot, is
/// logged and counted; the run moves on to the next target. A failed fetch
/// leaves the target's cache entry as it was.
pub async fn run(ctx: &AppContext) -> Result<RunSummary> {
    let targets = by_priority(ctx.config.targets.clone());
    let mut summary = RunSummary::default();

    if targets.is_empty() {
        println!("No targets configured");
        return Ok(summary);
    }

    info!("Checking {} targets", targets.len());

    for target in targets {
        let outcome = match target.kind {
            TargetKind::Feed => check_feed(ctx, &target).await,
            TargetKind::Page => check_page(ctx, &target).await,
        };

        match outcome {
            Ok(status) if status.is_changed() => summary.changed += 1,
            Ok(_) => summary.unchanged += 1,
            Err(e) => {
                warn!("Skipping {}: {}", target.url, e);
                summary.errors += 1;
            }
        }
    }

    println!(
        "Run complete: {} changed, {} unchanged, {} errors",
        summary.changed, summary.unchanged, summary.errors
    );
    Ok(summary)
}

async fn check_feed(ctx: &AppContext, target: &Target) -> Result<ChangeStatus> {
    let feed = ctx.ingestor.fetch_channel(&target.url).await?;
    let keys: Vec<_> = feed.items.iter().map(FeedItem::content_key).collect();

    let status = record_snapshot(ctx.store.as_ref(), &target.url, &keys)?;
    if status.is_changed() {
        println!("== {} [{}] {}", feed.channel_name, target.category, status);
        print_items(&feed.items);
    }
    Ok(status)
}

async fn check_page(ctx: &AppContext, target: &Target) -> Result<ChangeStatus> {
    let records = ctx.scraper.scrape(&target.url).await?;
    let keys: Vec<_> = records.iter().map(ExtractedRecord::content_key).collect();

    let status = record_snapshot(ctx.store.as_ref(), &target.url, &keys)?;
    if status.is_changed() {
        println!("== {} [{}] {}", target.url, target.category, status);
        print_records(&records);
    }
    Ok(status)
}

/// Hash a serialized snapshot of fetched content and record it under `url`.
///
/// Callers pass content keys rather than whole items so that counters and
/// parse-time defaults never register as a change.
pub fn record_snapshot<T: Serialize>(
    store: &dyn ChangeStore,
    url: &str,
    snapshot: &T,
) -> Result<ChangeStatus> {
    let bytes = serde_json::to_vec(snapshot)?;
    store.check(url, &content_hash(bytes))
}

fn print_items(items: &[FeedItem]) {
    for item in items {
        println!(
            "{}  {}",
            item.published.format("%Y-%m-%d %H:%M"),
            item.display_title()
        );
        println!("    {}", item.link);
    }
}

fn print_records(records: &[ExtractedRecord]) {
    for record in records {
        let when = record
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let thread = if record.is_thread { " (thread)" } else { "" };

        println!("[{}] @{} {}{}", record.id, record.author, when, thread);
        println!("    {}", record.text);
        if let Some(url) = &record.url {
            println!("    {}", url);
        }
    }
}
