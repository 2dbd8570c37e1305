//! File identifier cache for inline mode.
//!
//! When a diagram has been uploaded once, Telegram hands back a `file_id`
//! that can be reused in inline results without re-uploading the bytes.
//! Entries are keyed by the diagram hash and expire after
//! [`config::cache::FILE_ID_TTL_SECS`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use teloxide::types::FileId;

use crate::core::config;

/// Stable identifier for a piece of diagram source.
///
/// Derived from SHA-256 so the same source maps to the same inline result id
/// and cache slot across restarts.
pub fn diagram_hash(code: &str) -> u64 {
    let digest = Sha256::digest(code.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

struct CachedFileId {
    file_id: FileId,
    cached_at: Instant,
}

/// TTL cache mapping diagram hashes to Telegram file identifiers
pub struct FileIdCache {
    entries: Arc<Mutex<HashMap<u64, CachedFileId>>>,
    ttl: Duration,
}

impl FileIdCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a file id, evicting it if the entry has expired
    pub fn get(&self, key: u64) -> Option<FileId> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(&key) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => {
                log::info!("Using cached file_id for diagram {}", key);
                Some(entry.file_id.clone())
            }
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: u64, file_id: FileId) {
        if let Ok(mut entries) = self.entries.lock() {
            log::info!("Cached new file_id for diagram {}", key);
            entries.insert(key, CachedFileId {
                file_id,
                cached_at: Instant::now(),
            });
        }
    }

    /// Remove expired entries, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("File id cache cleanup removed {} expired entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static FILE_ID_CACHE: Lazy<FileIdCache> = Lazy::new(|| FileIdCache::new(config::cache::file_id_ttl()));

/// Look up a previously uploaded file id for this diagram hash
pub fn get_cached_file_id(key: u64) -> Option<FileId> {
    FILE_ID_CACHE.get(key)
}

/// Remember the file id Telegram assigned to an uploaded diagram
pub fn cache_file_id(key: u64, file_id: FileId) {
    FILE_ID_CACHE.set(key, file_id);
}

/// Drop expired file id entries
pub fn cleanup_file_id_cache() -> usize {
    FILE_ID_CACHE.cleanup()
}
