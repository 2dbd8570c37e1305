//! TTL cache of render outcomes.
//!
//! Failures are cached alongside successes: a diagram that fails to parse
//! keeps failing the same way, and replaying the stored error is much
//! cheaper than opening another browser tab for it.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;
use crate::render::RenderOutcome;

/// One cached outcome with its insertion time
struct CachedOutcome {
    outcome: RenderOutcome,
    cached_at: Instant,
}

/// Render outcome cache with TTL
pub struct RenderCache {
    cache: Arc<Mutex<HashMap<String, CachedOutcome>>>,
    ttl: Duration,
    hit_count: Arc<Mutex<u64>>,
    miss_count: Arc<Mutex<u64>>,
}

impl RenderCache {
    /// Creates a cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            hit_count: Arc::new(Mutex::new(0)),
            miss_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the cached outcome, or None if absent or expired
    pub async fn get(&self, key: &str) -> Option<RenderOutcome> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(key) {
            if Instant::now().duration_since(cached.cached_at) < self.ttl {
                *self.hit_count.lock().await += 1;
                return Some(cached.outcome.clone());
            } else {
                cache.remove(key);
            }
        }
        *self.miss_count.lock().await += 1;
        None
    }

    /// Stores an outcome, success or failure alike
    pub async fn set(&self, key: String, outcome: RenderOutcome) {
        let mut cache = self.cache.lock().await;
        cache.insert(
            key,
            CachedOutcome {
                outcome,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drops expired entries, returning how many were removed
    pub async fn cleanup(&self) -> usize {
        let mut cache = self.cache.lock().await;
        let before = cache.len();
        cache.retain(|_, cached| Instant::now().duration_since(cached.cached_at) < self.ttl);
        let removed = before - cache.len();
        log::debug!("Cleaned up {} expired render cache entries", removed);
        removed
    }

    /// Current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let cache = self.cache.lock().await;
        let hits = *self.hit_count.lock().await;
        let misses = *self.miss_count.lock().await;
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: cache.len(),
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Cache key for a diagram source: lowercase hex SHA-256.
///
/// Stable across processes, so ids derived from it survive restarts.
pub fn cache_key(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Global render cache (singleton)
static RENDER_CACHE: once_cell::sync::Lazy<RenderCache> =
    once_cell::sync::Lazy::new(|| RenderCache::new(config::cache::render_ttl()));

/// Returns the cached outcome for a diagram source, if any
pub async fn get_cached_outcome(key: &str) -> Option<RenderOutcome> {
    RENDER_CACHE.get(key).await
}

/// Stores a render outcome for a diagram source
pub async fn cache_outcome(key: String, outcome: RenderOutcome) {
    RENDER_CACHE.set(key, outcome).await;
}

/// Drops expired render cache entries
pub async fn cleanup_render_cache() -> usize {
    RENDER_CACHE.cleanup().await
}

/// Current render cache statistics
pub async fn render_cache_stats() -> CacheStats {
    RENDER_CACHE.stats().await
}
