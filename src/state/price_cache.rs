use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::time::Instant;

/// A memoised fetch result. `price` is `None` when the provider had nothing,
/// which is cached as well so a bad ticker is not re-requested within the TTL.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub price: Option<Decimal>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Process-wide price cache keyed by uppercased symbol.
///
/// Cheap to clone (an Arc bump). DashMap shards its locks, so concurrent
/// sessions writing the same key resolve as last-write-wins.
#[derive(Clone, Debug)]
pub struct PriceCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        PriceCache {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Returns the entry for `key` only while it is younger than the TTL.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?;
        entry.is_fresh(self.ttl).then(|| entry.value().clone())
    }

    pub fn insert(&self, key: String, price: Option<Decimal>) {
        self.entries.insert(
            key,
            CacheEntry {
                price,
                fetched_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops expired entries. Lookups ignore them anyway; this only bounds memory.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        // Other sessions may insert while we retain.
        before.saturating_sub(self.entries.len())
    }
}
