use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CACHE_VERSION: &str = "1.0";

/// Last-seen fingerprint of one monitored source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub url: String,
    pub content_hash: String,
    pub last_checked: DateTime<Utc>,
    pub last_changed: DateTime<Utc>,
    pub check_count: u64,
}

impl CacheEntry {
    pub fn new(url: &str, content_hash: &str, now: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            content_hash: content_hash.to_string(),
            last_checked: now,
            last_changed: now,
            check_count: 1,
        }
    }

    /// True when the most recent check saw different content (or was the first check).
    pub fn changed_on_last_check(&self) -> bool {
        self.last_changed == self.last_checked
    }
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    pub version: String,
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

/// Verdict of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    New,
    Updated,
    Unchanged,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::New => "new",
            ChangeStatus::Updated => "updated",
            ChangeStatus::Unchanged => "unchanged",
        }
    }

    /// Whether downstream processing should run for this verdict.
    pub fn is_changed(&self) -> bool {
        !matches!(self, ChangeStatus::Unchanged)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub last_check: Option<DateTime<Utc>>,
    pub changed_on_last_check: usize,
}

impl Cache {
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            last_check: self.entries.values().map(|e| e.last_checked).max(),
            changed_on_last_check: self
                .entries
                .values()
                .filter(|e| e.changed_on_last_check())
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_entry_serializes_camel_case() {
        let now = Utc::now();
        let entry = CacheEntry::new("https://a.example", "abc", now);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["contentHash"], "abc");
        assert_eq!(json["checkCount"], 1);
        assert!(json.get("lastChecked").is_some());
        assert!(json.get("lastChanged").is_some());
    }

    #[test]
    fn test_stats_counts_changed_entries() {
        let now = Utc::now();
        let mut cache = Cache::default();
        cache
            .entries
            .insert("a".into(), CacheEntry::new("a", "h", now));

        let mut stale = CacheEntry::new("b", "h", now - Duration::hours(2));
        stale.last_checked = now - Duration::hours(1);
        stale.check_count = 2;
        cache.entries.insert("b".into(), stale);

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.changed_on_last_check, 1);
        assert_eq!(stats.last_check, Some(now));
    }

    #[test]
    fn test_empty_stats() {
        let stats = Cache::default().stats();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.last_check, None);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(ChangeStatus::New.to_string(), "new");
        assert_eq!(ChangeStatus::Updated.to_string(), "updated");
        assert_eq!(ChangeStatus::Unchanged.to_string(), "unchanged");
        assert!(!ChangeStatus::Unchanged.is_changed());
    }
}
