//! Channel feed parsing.
//!
//! Documents go through `feed-rs` first. When that rejects the document
//! (truncated XML, stray markup inside an entry), a permissive tag scanner
//! recovers whatever complete `<entry>` blocks it can find.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::app::{MonitorError, Result};
use crate::domain::{ChannelFeed, FeedItem};

const VIDEO_ID_PREFIX: &str = "yt:video:";

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a feed document into a channel name and entries ordered by
    /// published time, newest first. Entries without a stable video id are
    /// dropped; an empty feed is not an error.
    pub fn normalize(&self, body: &[u8]) -> Result<ChannelFeed> {
        let mut feed = match parser::parse(body) {
            Ok(parsed) => Self::from_model(parsed),
            Err(e) => {
                warn!("Strict feed parse failed ({}); scanning tags instead", e);
                let text = String::from_utf8_lossy(body);
                Self::scan(&text)?
            }
        };

        let mut seen = HashSet::new();
        feed.items.retain(|item| seen.insert(item.video_id.clone()));
        feed.items.sort_by(|a, b| b.published.cmp(&a.published));

        debug!(
            "Parsed {} entries for channel {:?}",
            feed.items.len(),
            feed.channel_name
        );
        Ok(feed)
    }

    fn from_model(parsed: feed_rs::model::Feed) -> ChannelFeed {
        let channel_name = parsed
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .filter(|t| !t.trim().is_empty())
            .or_else(|| parsed.authors.first().map(|a| a.name.clone()))
            .or_else(|| {
                parsed
                    .entries
                    .iter()
                    .find_map(|e| e.authors.first().map(|a| a.name.clone()))
            })
            .unwrap_or_default();

        let items = parsed
            .entries
            .into_iter()
            .filter_map(|entry| Self::item_from_entry(entry, &channel_name))
            .collect();

        ChannelFeed {
            channel_name,
            items,
        }
    }

    fn item_from_entry(entry: Entry, channel_name: &str) -> Option<FeedItem> {
        let link = entry.links.first().map(|l| l.href.clone());
        let Some(video_id) = Self::video_id(&entry.id, link.as_deref()) else {
            debug!("Dropping entry without a video id: {:?}", entry.id);
            return None;
        };

        let now = Utc::now();
        let mut item = FeedItem::new(video_id);
        item.title = entry
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default();
        item.link = link.unwrap_or_default();
        item.channel_name = entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| channel_name.to_string());
        let source_date = entry.published.or(entry.updated);
        item.published_supplied = source_date.is_some();
        item.published = source_date.unwrap_or(now);
        item.updated = entry.updated.unwrap_or(item.published);

        let media = entry.media.first();
        item.description = media
            .and_then(|m| m.description.as_ref())
            .map(|d| d.content.clone())
            .or_else(|| entry.summary.map(|s| s.content))
            .map(|d| decode_html_entities(&d).to_string())
            .unwrap_or_default();
        item.thumbnail = media
            .and_then(|m| m.thumbnails.first())
            .map(|t| t.image.uri.clone());

        Some(item)
    }

    /// Stable id from the entry id (`yt:video:<id>`), falling back to the
    /// `v=` parameter of the watch link.
    fn video_id(entry_id: &str, link: Option<&str>) -> Option<String> {
        if let Some(id) = entry_id.strip_prefix(VIDEO_ID_PREFIX) {
            if !id.trim().is_empty() {
                return Some(id.trim().to_string());
            }
        }

        let link = Url::parse(link?).ok()?;
        link.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    }

    /// Permissive fallback: pull complete entry blocks out of raw markup.
    fn scan(text: &str) -> Result<ChannelFeed> {
        if !text.contains("<feed") {
            return Err(MonitorError::FeedParse("document is not a feed".to_string()));
        }

        let head = text.split("<entry").next().unwrap_or_default();
        let channel_name = tag_text(head, "title")
            .or_else(|| tag_text(head, "name"))
            .unwrap_or_default();

        let entry_block = Regex::new(r"(?s)<entry\b[^>]*>(.*?)</entry>")
            .map_err(|e| MonitorError::FeedParse(e.to_string()))?;

        let now = Utc::now();
        let items = entry_block
            .captures_iter(text)
            .filter_map(|caps| {
                let block = caps.get(1)?.as_str();
                let video_id = tag_text(block, "yt:videoId")?;

                let mut item = FeedItem::new(video_id);
                item.title = tag_text(block, "title").unwrap_or_default();
                item.link = attr_value(block, "link", "href").unwrap_or_default();
                item.channel_name = tag_text(block, "name").unwrap_or_else(|| channel_name.clone());
                item.description = tag_text(block, "media:description").unwrap_or_default();
                item.thumbnail = attr_value(block, "media:thumbnail", "url");
                let updated = tag_text(block, "updated").and_then(|s| parse_time(&s));
                let source_date = tag_text(block, "published")
                    .and_then(|s| parse_time(&s))
                    .or(updated);
                item.published_supplied = source_date.is_some();
                item.published = source_date.unwrap_or(now);
                item.updated = updated.unwrap_or(item.published);
                Some(item)
            })
            .collect();

        Ok(ChannelFeed {
            channel_name,
            items,
        })
    }
}

/// Text of the first `<tag>...</tag>` in `block`, entity-decoded and trimmed.
fn tag_text(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut rest = block;
    while let Some(pos) = rest.find(&open) {
        let after = &rest[pos + open.len()..];
        // Skip longer tag names sharing the prefix, e.g. <name> vs <namespace>
        if !after.starts_with('>') && !after.starts_with(' ') {
            rest = after;
            continue;
        }
        let start = after.find('>')? + 1;
        let body = &after[start..];
        let end = body.find(&close)?;
        let value = decode_html_entities(body[..end].trim()).to_string();
        return (!value.is_empty()).then_some(value);
    }
    None
}

/// Value of `attr` on the first `<tag ...>` element in `block`.
fn attr_value(block: &str, tag: &str, attr: &str) -> Option<String> {
    let open = format!("<{} ", tag);
    let start = block.find(&open)?;
    let element = &block[start..];
    let element = &element[..element.find('>')?];
    let pattern = format!("{}=\"", attr);
    let value_start = element.find(&pattern)? + pattern.len();
    let value = &element[value_start..];
    let value = &value[..value.find('"')?];
    Some(decode_html_entities(value).to_string())
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
  <id>yt:channel:UCabcdefghijklmnopqrstuv</id>
  <yt:channelId>UCabcdefghijklmnopqrstuv</yt:channelId>
  <title>Rust &amp; Friends</title>
  <author>
    <name>Rust Friends</name>
    <uri>https://www.youtube.com/channel/UCabcdefghijklmnopqrstuv</uri>
  </author>
  <entry>
    <id>yt:video:older111111</id>
    <yt:videoId>older111111</yt:videoId>
    <title>Older video</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=older111111"/>
    <published>2024-01-01T00:00:00+00:00</published>
    <updated>2024-01-02T00:00:00+00:00</updated>
    <media:group>
      <media:title>Older video</media:title>
      <media:thumbnail url="https://i.ytimg.com/vi/older111111/hqdefault.jpg" width="480" height="360"/>
      <media:description>First upload</media:description>
    </media:group>
  </entry>
  <entry>
    <id>yt:video:newer222222</id>
    <yt:videoId>newer222222</yt:videoId>
    <title>Newer video</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=newer222222"/>
    <published>2024-03-01T00:00:00+00:00</published>
  </entry>
</feed>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Quiet Channel</title>
</feed>"#;

    #[test]
    fn test_parse_channel_feed() {
        let feed = Normalizer::new().normalize(CHANNEL_FEED.as_bytes()).unwrap();

        assert_eq!(feed.channel_name, "Rust & Friends");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].video_id, "newer222222");
        assert_eq!(feed.items[1].video_id, "older111111");
        assert_eq!(feed.items[1].title, "Older video");
        assert_eq!(
            feed.items[1].link,
            "https://www.youtube.com/watch?v=older111111"
        );
    }

    #[test]
    fn test_media_fields() {
        let feed = Normalizer::new().normalize(CHANNEL_FEED.as_bytes()).unwrap();
        let older = &feed.items[1];
        assert_eq!(older.description, "First upload");
        assert_eq!(
            older.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/older111111/hqdefault.jpg")
        );
        // Missing media group falls back to defaults
        assert_eq!(feed.items[0].description, "");
        assert!(feed.items[0].thumbnail.is_none());
    }

    #[test]
    fn test_empty_feed_is_not_an_error() {
        let feed = Normalizer::new().normalize(EMPTY_FEED.as_bytes()).unwrap();
        assert_eq!(feed.channel_name, "Quiet Channel");
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_entries_without_video_id_are_dropped() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Mixed</title>
  <entry>
    <id>urn:something:else</id>
    <title>No stable id</title>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
  <entry>
    <id>yt:video:keepme12345</id>
    <title>Keep</title>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;
        let feed = Normalizer::new().normalize(doc.as_bytes()).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].video_id, "keepme12345");
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Dupes</title>
  <entry><id>yt:video:same0000000</id><title>A</title><updated>2024-01-01T00:00:00Z</updated></entry>
  <entry><id>yt:video:same0000000</id><title>B</title><updated>2024-01-01T00:00:00Z</updated></entry>
</feed>"#;
        let feed = Normalizer::new().normalize(doc.as_bytes()).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "A");
    }

    #[test]
    fn test_undated_entries_are_flagged() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Undated</title>
  <entry><id>yt:video:nodate00000</id><title>No date</title></entry>
</feed>"#;
        let feed = Normalizer::new().normalize(doc.as_bytes()).unwrap();
        assert!(!feed.items[0].published_supplied);

        let dated = Normalizer::new().normalize(CHANNEL_FEED.as_bytes()).unwrap();
        assert!(dated.items.iter().all(|i| i.published_supplied));
    }

    #[test]
    fn test_video_id_from_watch_link() {
        assert_eq!(
            Normalizer::video_id("", Some("https://www.youtube.com/watch?v=xyz")),
            Some("xyz".to_string())
        );
        assert_eq!(Normalizer::video_id("random", None), None);
    }

    #[test]
    fn test_malformed_document_uses_tag_scanner() {
        // Unclosed <feed> and a broken trailing entry
        let doc = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Broken &amp; Co</title>
  <entry>
    <yt:videoId>good1234567</yt:videoId>
    <title>Survives</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=good1234567"/>
    <published>2024-02-01T00:00:00+00:00</published>
  </entry>
  <entry>
    <title>No id here</title>
  </entry>
  <entry>
    <yt:videoId>cut"#;
        let feed = Normalizer::new().normalize(doc.as_bytes()).unwrap();
        assert_eq!(feed.channel_name, "Broken & Co");
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].video_id, "good1234567");
        assert_eq!(feed.items[0].title, "Survives");
        assert_eq!(
            feed.items[0].link,
            "https://www.youtube.com/watch?v=good1234567"
        );
    }

    #[test]
    fn test_non_feed_document_is_an_error() {
        let err = Normalizer::new()
            .normalize(b"<html><body>consent</body></html>")
            .unwrap_err();
        assert!(matches!(err, MonitorError::FeedParse(_)));
    }

    #[test]
    fn test_tag_text_skips_longer_names() {
        assert_eq!(
            tag_text("<namespace>x</namespace><name>Bob</name>", "name"),
            Some("Bob".to_string())
        );
    }
}
