pub mod json;

use sha2::{Digest, Sha256};

use crate::app::Result;
use crate::domain::{Cache, CacheEntry, CacheStats, ChangeStatus};

pub use json::JsonCacheStore;

pub trait ChangeStore {
    /// Current persisted state. Never fails: a missing or unreadable cache
    /// is reported as an empty one.
    fn load(&self) -> Cache;

    /// Record `content_hash` for `url` and classify it against the previous check.
    fn check(&self, url: &str, content_hash: &str) -> Result<ChangeStatus>;

    fn get(&self, url: &str) -> Option<CacheEntry>;
    fn remove(&self, url: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;

    fn stats(&self) -> CacheStats {
        self.load().stats()
    }
}

/// Fixed-length fingerprint of fetched content (lowercase hex SHA-256).
pub fn content_hash(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_hex_sha256() {
        let hash = content_hash("hello");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_content_hash_differs() {
        assert_ne!(content_hash("a"), content_hash("b"));
        assert_eq!(content_hash(b"a"), content_hash("a"));
    }
}
