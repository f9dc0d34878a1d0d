use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a channel feed after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub video_id: String,
    pub title: String,
    pub link: String,
    pub channel_name: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// False when `published` is the parse-time default rather than a date
    /// from the document.
    #[serde(default)]
    pub published_supplied: bool,
}

/// The parts of a [`FeedItem`] that identify its content across fetches.
#[derive(Debug, Serialize)]
pub struct FeedItemKey<'a> {
    pub video_id: &'a str,
    pub title: &'a str,
    pub link: &'a str,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(video_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            video_id: video_id.into(),
            title: String::new(),
            link: String::new(),
            channel_name: String::new(),
            description: String::new(),
            thumbnail: None,
            published: now,
            updated: now,
            published_supplied: false,
        }
    }

    pub fn content_key(&self) -> FeedItemKey<'_> {
        FeedItemKey {
            video_id: &self.video_id,
            title: &self.title,
            link: &self.link,
            published: self.published_supplied.then_some(self.published),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

/// A parsed feed document: channel name plus its entries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFeed {
    pub channel_name: String,
    pub items: Vec<FeedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let item = FeedItem::new("abc");
        assert_eq!(item.video_id, "abc");
        assert_eq!(item.title, "");
        assert_eq!(item.display_title(), "(Untitled)");
        assert!(item.thumbnail.is_none());
        assert!(!item.published_supplied);
    }

    #[test]
    fn test_content_key_ignores_default_dates() {
        let a = FeedItem::new("abc");
        let mut b = a.clone();
        b.published = a.published + chrono::Duration::seconds(30);
        b.updated = b.published;
        b.description = "edited".into();

        let key = |i: &FeedItem| serde_json::to_string(&i.content_key()).unwrap();
        assert_eq!(key(&a), key(&b));

        b.published_supplied = true;
        assert_ne!(key(&a), key(&b));
    }
}
