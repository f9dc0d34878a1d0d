use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement counters shown next to a post. Absent counters parse as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub replies: u64,
    pub reposts: u64,
    pub likes: u64,
    pub views: Option<u64>,
}

/// One post scraped from a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub id: String,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub author: String,
    pub url: Option<String>,
    pub engagement: Option<Engagement>,
    pub media: Vec<String>,
    pub is_thread: bool,
}

/// The parts of an [`ExtractedRecord`] that identify its content across
/// scrapes. Engagement counters and rendered timestamps are left out.
#[derive(Debug, Serialize)]
pub struct RecordKey<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub media: &'a [String],
}

impl ExtractedRecord {
    pub fn content_key(&self) -> RecordKey<'_> {
        RecordKey {
            id: &self.id,
            text: &self.text,
            media: &self.media,
        }
    }

    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp: None,
            author: String::new(),
            url: None,
            engagement: None,
            media: Vec::new(),
            is_thread: false,
        }
    }

    /// A record without an identifier or body must never leave the extractor.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.text.trim().is_empty()
    }
}

/// Keep the first `limit` records in their observed order.
pub fn take_first<T>(mut records: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}
