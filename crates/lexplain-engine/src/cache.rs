//! In-memory result cache with TTL freshness and LRU eviction.
//!
//! Entry lifecycle: absent → live-fresh (TTL active) → stale (TTL expired,
//! entry retained for offline fallback) → evicted (LRU pressure or sweep).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lexplain_core::{CacheConfig, FeatureCategory, Fingerprint, RiskRecord};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A cache lookup result. Expired entries are still returned — staleness is
/// the caller's signal, eviction is the cache's job.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub record: RiskRecord,
    pub created_at: DateTime<Utc>,
    /// True once the entry's TTL has passed.
    pub expired: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: RiskRecord,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    /// Monotonic access counter for LRU ordering.
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Fingerprint, CacheEntry>,
    seq: u64,
}

/// Shared analysis-result cache keyed by fingerprint.
///
/// Reads and writes for different fingerprints only contend on the map
/// lock itself, which is never held across an await.
#[derive(Debug)]
pub struct AnalysisCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl AnalysisCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// The configured TTL for a feature category.
    pub fn ttl_for(&self, category: FeatureCategory) -> Duration {
        self.config.ttl_for(category)
    }

    /// Look up an entry, refreshing its LRU position.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheHit> {
        let mut inner = self.inner.lock().await;
        inner.seq += 1;
        let seq = inner.seq;
        let entry = inner.entries.get_mut(fingerprint)?;
        entry.last_used = seq;
        Some(CacheHit {
            record: entry.record.clone(),
            created_at: entry.created_at,
            expired: Utc::now() >= entry.expires_at,
        })
    }

    /// Insert or replace an entry with a fresh TTL, evicting
    /// least-recently-used entries beyond the configured ceiling.
    pub async fn put(&self, fingerprint: Fingerprint, record: RiskRecord, ttl: Duration) {
        let now = Utc::now();
        let expires_at = now
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));

        let mut inner = self.inner.lock().await;
        inner.seq += 1;
        let seq = inner.seq;
        inner.entries.insert(
            fingerprint,
            CacheEntry {
                record,
                created_at: now,
                expires_at,
                last_used: seq,
            },
        );

        while inner.entries.len() > self.config.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    debug!(fingerprint = %key, "evicting least-recently-used cache entry");
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Remove entries past their TTL. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.expires_at > now);
        let removed = before - inner.entries.len();
        if removed > 0 {
            info!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lexplain_core::{ClauseSpan, DetailLevel, RiskLevel};

    fn record(text: &str) -> RiskRecord {
        RiskRecord {
            span: ClauseSpan::new(0, text.len(), text),
            level: RiskLevel::Low,
            score: 0.0,
            matches: Vec::new(),
            primary_driver: None,
            confidence: 1.0,
            explanation: "No risk-signaling patterns were detected in this clause.".into(),
            citation: None,
            detail_level: DetailLevel::Medium,
            ruleset_version: "builtin-1".into(),
            created_at: Utc::now(),
            incomplete: false,
        }
    }

    fn fp(text: &str) -> Fingerprint {
        Fingerprint::compute(text, "builtin-1")
    }

    fn cache(max_entries: usize) -> AnalysisCache {
        AnalysisCache::new(CacheConfig {
            max_entries,
            ..CacheConfig::default()
        })
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = cache(8);
        assert!(cache.get(&fp("a")).await.is_none());

        cache
            .put(fp("a"), record("a"), Duration::from_secs(60))
            .await;
        let hit = cache.get(&fp("a")).await.unwrap();
        assert!(!hit.expired);
        assert_eq!(hit.record.span.text, "a");
    }

    #[tokio::test]
    async fn expired_entries_are_retained_and_flagged() {
        let cache = cache(8);
        cache.put(fp("a"), record("a"), Duration::ZERO).await;

        let hit = cache.get(&fp("a")).await.unwrap();
        assert!(hit.expired, "zero-TTL entry must read as stale");
        assert_eq!(cache.len().await, 1, "stale entries stay until evicted");
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let cache = cache(8);
        cache.put(fp("stale"), record("stale"), Duration::ZERO).await;
        cache
            .put(fp("fresh"), record("fresh"), Duration::from_secs(60))
            .await;

        let removed = cache.sweep().await;
        assert_eq!(removed, 1);
        assert!(cache.get(&fp("stale")).await.is_none());
        assert!(cache.get(&fp("fresh")).await.is_some());
    }

    #[tokio::test]
    async fn lru_eviction_beyond_ceiling() {
        let cache = cache(2);
        let ttl = Duration::from_secs(60);
        cache.put(fp("a"), record("a"), ttl).await;
        cache.put(fp("b"), record("b"), ttl).await;

        // Touch "a" so "b" becomes the least recently used.
        cache.get(&fp("a")).await.unwrap();

        cache.put(fp("c"), record("c"), ttl).await;
        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&fp("a")).await.is_some());
        assert!(cache.get(&fp("b")).await.is_none(), "LRU entry must go first");
        assert!(cache.get(&fp("c")).await.is_some());
    }

    #[tokio::test]
    async fn put_replaces_and_refreshes() {
        let cache = cache(8);
        cache.put(fp("a"), record("a"), Duration::ZERO).await;
        assert!(cache.get(&fp("a")).await.unwrap().expired);

        cache
            .put(fp("a"), record("a"), Duration::from_secs(60))
            .await;
        assert!(!cache.get(&fp("a")).await.unwrap().expired);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let cache = cache(8);
        cache
            .put(fp("a"), record("a"), Duration::from_secs(60))
            .await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
