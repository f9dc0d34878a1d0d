use ::scraper::{ElementRef, Html, Selector};
use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::app::{MonitorError, Result};
use crate::domain::{Engagement, ExtractedRecord};

const RECORD: &str = r#"article[data-testid="tweet"]"#;
const TEXT: &str = r#"div[data-testid="tweetText"]"#;
const PERMALINK: &str = r#"a[href*="/status/"]"#;
const TIME: &str = "time[datetime]";
const AUTHOR: &str = r#"div[data-testid="User-Name"] a[href^="/"]"#;
const REPLIES: &str = r#"[data-testid="reply"]"#;
const REPOSTS: &str = r#"[data-testid="retweet"]"#;
const LIKES: &str = r#"[data-testid="like"]"#;
const VIEWS: &str = r#"a[href*="/analytics"]"#;
const MEDIA: &str = r#"div[data-testid="tweetPhoto"] img, video"#;

const THREAD_MARKER: &str = "Show this thread";

/// Pure page-snapshot → records extraction.
///
/// Runs against the HTML of a rendered page, so it is testable with fixture
/// documents and never touches the browser session.
pub struct ContentExtractor {
    record: Selector,
    text: Selector,
    permalink: Selector,
    time: Selector,
    author: Selector,
    replies: Selector,
    reposts: Selector,
    likes: Selector,
    views: Selector,
    media: Selector,
}

impl ContentExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            record: parse_selector(RECORD)?,
            text: parse_selector(TEXT)?,
            permalink: parse_selector(PERMALINK)?,
            time: parse_selector(TIME)?,
            author: parse_selector(AUTHOR)?,
            replies: parse_selector(REPLIES)?,
            reposts: parse_selector(REPOSTS)?,
            likes: parse_selector(LIKES)?,
            views: parse_selector(VIEWS)?,
            media: parse_selector(MEDIA)?,
        })
    }

    /// Every valid record in page order. Records missing an id or body are
    /// skipped; missing optional fields fall back to defaults.
    pub fn extract(&self, html: &str, base: Option<&Url>) -> Vec<ExtractedRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut skipped = 0;

        for element in document.select(&self.record) {
            match self.extract_one(element, base) {
                Some(record) if record.is_valid() => records.push(record),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} records missing an id or body", skipped);
        }
        records
    }

    fn extract_one(&self, element: ElementRef<'_>, base: Option<&Url>) -> Option<ExtractedRecord> {
        let permalink = element
            .select(&self.permalink)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| status_id(href).is_some())?;
        let id = status_id(permalink)?;

        let text = element
            .select(&self.text)
            .next()
            .map(|t| normalize_whitespace(&t.text().collect::<String>()))?;

        let mut record = ExtractedRecord::new(id, text);
        record.url = Some(absolutize(permalink, base));
        record.timestamp = element
            .select(&self.time)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        record.author = element
            .select(&self.author)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| href.trim_start_matches('/').to_string())
            .find(|handle| !handle.is_empty() && !handle.contains('/'))
            .unwrap_or_default();
        record.engagement = self.engagement(element);
        record.media = element
            .select(&self.media)
            .filter_map(|m| m.value().attr("src").or_else(|| m.value().attr("poster")))
            .map(|src| absolutize(src, base))
            .collect();
        record.is_thread = element.text().any(|t| t.contains(THREAD_MARKER));

        Some(record)
    }

    fn engagement(&self, element: ElementRef<'_>) -> Option<Engagement> {
        let count = |selector: &Selector| {
            element.select(selector).next().map(|el| {
                el.value()
                    .attr("aria-label")
                    .and_then(parse_count)
                    .or_else(|| parse_count(&el.text().collect::<String>()))
                    .unwrap_or(0)
            })
        };

        let replies = count(&self.replies);
        let reposts = count(&self.reposts);
        let likes = count(&self.likes);
        let views = count(&self.views);

        if replies.is_none() && reposts.is_none() && likes.is_none() && views.is_none() {
            return None;
        }

        Some(Engagement {
            replies: replies.unwrap_or(0),
            reposts: reposts.unwrap_or(0),
            likes: likes.unwrap_or(0),
            views,
        })
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| MonitorError::Config(format!("bad selector {s}: {e:?}")))
}

/// Numeric id following `/status/` in a permalink.
fn status_id(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("/status/")?;
    let id: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!id.is_empty()).then_some(id)
}

/// First count-looking token: "1,234" → 1234, "1.2K" → 1200, "3M" → 3000000.
pub fn parse_count(s: &str) -> Option<u64> {
    s.split_whitespace().find_map(|token| {
        let token = token.replace(',', "");
        let (number, multiplier) = match token.chars().last()? {
            'K' | 'k' => (&token[..token.len() - 1], 1_000.0),
            'M' | 'm' => (&token[..token.len() - 1], 1_000_000.0),
            'B' | 'b' => (&token[..token.len() - 1], 1_000_000_000.0),
            _ => (token.as_str(), 1.0),
        };
        let value: f64 = number.parse().ok()?;
        (value >= 0.0).then(|| (value * multiplier).round() as u64)
    })
}

fn absolutize(href: &str, base: Option<&Url>) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMELINE: &str = r#"
<html><body>
<article data-testid="tweet">
  <div data-testid="User-Name"><a href="/rustlang">Rust Language</a></div>
  <a href="/rustlang/status/1001"><time datetime="2024-05-01T12:00:00.000Z">May 1</time></a>
  <div data-testid="tweetText">Rust 1.78 is out!
     Check the blog.</div>
  <div data-testid="tweetPhoto"><img src="https://pbs.example/media/a.jpg"></div>
  <button data-testid="reply" aria-label="12 Replies. Reply"></button>
  <button data-testid="retweet" aria-label="1,234 reposts. Repost"></button>
  <button data-testid="like"><span>5.6K</span></button>
  <a href="/rustlang/status/1001/analytics"><span>1.2M</span></a>
  <span>Show this thread</span>
</article>
<article data-testid="tweet">
  <div data-testid="tweetText">No permalink, must be skipped</div>
</article>
<article data-testid="tweet">
  <a href="/someone/status/1002">link</a>
</article>
<article data-testid="tweet">
  <a href="/other/status/1003">link</a>
  <div data-testid="tweetText">Bare record</div>
</article>
</body></html>"#;

    fn extract(html: &str) -> Vec<ExtractedRecord> {
        let base = Url::parse("https://x.example/rustlang").unwrap();
        ContentExtractor::new().unwrap().extract(html, Some(&base))
    }

    #[test]
    fn test_extracts_full_record() {
        let records = extract(TIMELINE);
        let first = &records[0];

        assert_eq!(first.id, "1001");
        assert_eq!(first.text, "Rust 1.78 is out! Check the blog.");
        assert_eq!(first.author, "rustlang");
        assert_eq!(
            first.url.as_deref(),
            Some("https://x.example/rustlang/status/1001")
        );
        assert_eq!(
            first.timestamp,
            Some(
                DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc)
            )
        );
        assert_eq!(first.media, vec!["https://pbs.example/media/a.jpg"]);
        assert!(first.is_thread);

        let engagement = first.engagement.as_ref().unwrap();
        assert_eq!(engagement.replies, 12);
        assert_eq!(engagement.reposts, 1234);
        assert_eq!(engagement.likes, 5600);
        assert_eq!(engagement.views, Some(1_200_000));
    }

    #[test]
    fn test_skips_invalid_records_and_keeps_order() {
        let records = extract(TIMELINE);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "1003"]);
    }

    #[test]
    fn test_optional_fields_default() {
        let records = extract(TIMELINE);
        let bare = &records[1];
        assert_eq!(bare.text, "Bare record");
        assert_eq!(bare.author, "");
        assert!(bare.timestamp.is_none());
        assert!(bare.engagement.is_none());
        assert!(bare.media.is_empty());
        assert!(!bare.is_thread);
    }

    #[test]
    fn test_empty_page() {
        assert!(extract("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12 Replies. Reply"), Some(12));
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("1.2K"), Some(1200));
        assert_eq!(parse_count("3M"), Some(3_000_000));
        assert_eq!(parse_count("Reply"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn test_status_id() {
        assert_eq!(status_id("/a/status/42"), Some("42".to_string()));
        assert_eq!(status_id("/a/status/42/photo/1"), Some("42".to_string()));
        assert_eq!(status_id("/a/status/"), None);
        assert_eq!(status_id("/a/likes"), None);
    }
}
