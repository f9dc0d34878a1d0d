use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::app::{MonitorError, Result};

pub const DEFAULT_SITE_BASE: &str = "https://www.youtube.com";
pub const DEFAULT_FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";

const CHANNEL_ID_PREFIX: &str = "UC";
const CHANNEL_ID_LEN: usize = 24;

/// Patterns that carry the channel id in a channel page, most reliable first.
const IDENTIFIER_PATTERNS: [&str; 5] = [
    r#"<meta itemprop="(?:channelId|identifier)" content="(UC[A-Za-z0-9_-]{22})""#,
    r#""channelId":"(UC[A-Za-z0-9_-]{22})""#,
    r#""externalId":"(UC[A-Za-z0-9_-]{22})""#,
    r#"<link rel="canonical" href="[^"]*/channel/(UC[A-Za-z0-9_-]{22})""#,
    r#""browseId":"(UC[A-Za-z0-9_-]{22})""#,
];

static IDENTIFIER_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    IDENTIFIER_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// What a human-facing channel reference points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// The reference already contains the channel id
    Id(String),
    /// `@handle`, `/c/name` or `/user/name`: needs a page fetch to resolve
    Page(String),
}

/// `UC` followed by 22 characters of `[A-Za-z0-9_-]`.
pub fn is_channel_id(candidate: &str) -> bool {
    candidate.len() == CHANNEL_ID_LEN
        && candidate.starts_with(CHANNEL_ID_PREFIX)
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Classify `reference` without touching the network. `site_base` is used to
/// build the page URL for bare handles.
pub fn parse_channel_ref(reference: &str, site_base: &str) -> Result<ChannelRef> {
    let reference = reference.trim();

    if is_channel_id(reference) {
        return Ok(ChannelRef::Id(reference.to_string()));
    }

    if let Some(handle) = reference.strip_prefix('@') {
        if handle.is_empty() {
            return Err(MonitorError::NotFound(reference.to_string()));
        }
        return Ok(ChannelRef::Page(format!(
            "{}/@{}",
            site_base.trim_end_matches('/'),
            handle
        )));
    }

    let url = Url::parse(reference)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["channel", id, ..] if is_channel_id(id) => Ok(ChannelRef::Id(id.to_string())),
        ["channel", ..] => Err(MonitorError::InvalidIdentifier(reference.to_string())),
        [first, ..] if first.starts_with('@') && first.len() > 1 => {
            Ok(ChannelRef::Page(page_url(&url, &segments[..1])))
        }
        ["c", _, ..] | ["user", _, ..] => Ok(ChannelRef::Page(page_url(&url, &segments[..2]))),
        _ => Err(MonitorError::NotFound(reference.to_string())),
    }
}

fn page_url(url: &Url, segments: &[&str]) -> String {
    let mut page = url.clone();
    page.set_path(&format!("/{}", segments.join("/")));
    page.set_query(None);
    page.set_fragment(None);
    page.to_string()
}

/// First channel id found in a raw channel page, trying patterns in priority order.
pub fn scan_channel_id(document: &str) -> Option<String> {
    IDENTIFIER_REGEXES.iter().find_map(|re| {
        re.captures(document)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Feed URL for a channel id on the default host.
pub fn build_feed_url(identifier: &str) -> Result<String> {
    build_feed_url_with(DEFAULT_FEED_BASE, identifier)
}

pub fn build_feed_url_with(feed_base: &str, identifier: &str) -> Result<String> {
    if !is_channel_id(identifier) {
        return Err(MonitorError::InvalidIdentifier(identifier.to_string()));
    }
    let mut url = Url::parse(feed_base)?;
    url.query_pairs_mut().append_pair("channel_id", identifier);
    Ok(url.to_string())
}
