use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::{Cache, CacheEntry, ChangeStatus};
use crate::store::ChangeStore;

/// Change-detection cache persisted as a single JSON document.
///
/// Every call reloads the file and every mutation rewrites it in full.
/// There is no locking: one writer at a time.
pub struct JsonCacheStore {
    path: PathBuf,
}

impl JsonCacheStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, cache: &Cache) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(cache)?;

        // Write beside the target and rename so readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} cache entries to {}", cache.entries.len(), self.path.display());
        Ok(())
    }
}

impl ChangeStore for JsonCacheStore {
    fn load(&self) -> Cache {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Cache::default(),
            Err(e) => {
                warn!("Cannot read cache {}: {}; starting empty", self.path.display(), e);
                return Cache::default();
            }
        };

        match serde_json::from_str::<Cache>(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Corrupt cache {}: {}; starting empty", self.path.display(), e);
                Cache::default()
            }
        }
    }

    fn check(&self, url: &str, content_hash: &str) -> Result<ChangeStatus> {
        let mut cache = self.load();
        let now = Utc::now();

        let status = match cache.entries.get_mut(url) {
            None => {
                cache
                    .entries
                    .insert(url.to_string(), CacheEntry::new(url, content_hash, now));
                ChangeStatus::New
            }
            Some(entry) if entry.content_hash != content_hash => {
                entry.content_hash = content_hash.to_string();
                entry.last_changed = now;
                entry.last_checked = now;
                entry.check_count += 1;
                ChangeStatus::Updated
            }
            Some(entry) => {
                entry.last_checked = now;
                entry.check_count += 1;
                ChangeStatus::Unchanged
            }
        };

        self.save(&cache)?;
        debug!("Checked {}: {}", url, status);
        Ok(status)
    }

    fn get(&self, url: &str) -> Option<CacheEntry> {
        self.load().entries.remove(url)
    }

    fn remove(&self, url: &str) -> Result<()> {
        let mut cache = self.load();
        if cache.entries.remove(url).is_some() {
            self.save(&cache)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&Cache::default())
    }
}
