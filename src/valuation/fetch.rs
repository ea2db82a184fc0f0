use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::market_data::traits::MarketDataProvider;
use crate::market_data::types::{Period, ProviderError};
use crate::state::price_cache::PriceCache;
use crate::telemetry;

/// Cache key for a user-entered symbol. `None` for blank input.
pub fn cache_key(symbol: &str) -> Option<String> {
    let trimmed = symbol.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

/// Latest-close lookup memoised in a [`PriceCache`].
///
/// Concurrent fetches of the same symbol are serialised on a per-key lock;
/// whoever waits re-reads the cache instead of calling the provider again.
#[derive(Clone)]
pub struct PriceFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: PriceCache,
    inflight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PriceFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: PriceCache) -> Self {
        Self {
            provider,
            cache,
            inflight: Arc::new(DashMap::new()),
        }
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Latest close for `symbol`, or `None` when blank, unknown or unreachable.
    pub async fn fetch(&self, symbol: &str) -> Option<Decimal> {
        let key = cache_key(symbol)?;

        if let Some(entry) = self.cache.get(&key) {
            telemetry::record_cache_lookup(true);
            debug!(symbol = %key, cache = "hit", "price lookup");
            return entry.price;
        }

        let lock = self.inflight.entry(key.clone()).or_default().clone();
        let guard = lock.lock().await;

        // Someone else may have filled the entry while we waited.
        let price = match self.cache.get(&key) {
            Some(entry) => {
                telemetry::record_cache_lookup(true);
                debug!(symbol = %key, cache = "hit", "price lookup after wait");
                entry.price
            }
            None => {
                telemetry::record_cache_lookup(false);
                debug!(symbol = %key, cache = "miss", "price lookup");
                self.fetch_and_store(&key).await
            }
        };

        drop(guard);
        drop(lock);
        self.inflight.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        price
    }

    async fn fetch_and_store(&self, key: &str) -> Option<Decimal> {
        let provider = self.provider.name();

        match self.provider.get_recent_bars(key, Period::OneDay).await {
            Ok(bars) => {
                let price = bars.last().map(|bar| bar.close);
                let outcome = if price.is_some() { "ok" } else { "empty" };
                telemetry::record_provider_request(provider, outcome);
                debug!(symbol = key, bars = bars.len(), ?price, "provider returned history");
                self.cache.insert(key.to_string(), price);
                price
            }
            Err(ProviderError::NoData(_)) => {
                telemetry::record_provider_request(provider, "empty");
                debug!(symbol = key, "provider has no data");
                self.cache.insert(key.to_string(), None);
                None
            }
            Err(err) => {
                // Transport and parse failures are not memoised; the next trigger retries.
                telemetry::record_provider_request(provider, "error");
                warn!(symbol = key, provider, error = %err, "price fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::mock::MockProvider;
    use std::time::Duration;

    fn fetcher_with(provider: Arc<MockProvider>) -> PriceFetcher {
        PriceFetcher::new(provider, PriceCache::new(Duration::from_secs(60)))
    }

    #[test]
    fn cache_key_trims_and_uppercases() {
        assert_eq!(cache_key(" aapl "), Some("AAPL".to_string()));
        assert_eq!(cache_key("Brk-B"), Some("BRK-B".to_string()));
        assert_eq!(cache_key(""), None);
        assert_eq!(cache_key("   "), None);
    }

    #[tokio::test]
    async fn blank_symbol_never_reaches_provider() {
        let provider = Arc::new(MockProvider::with_close(Decimal::new(150, 0)));
        let fetcher = fetcher_with(provider.clone());

        assert_eq!(fetcher.fetch("").await, None);
        assert_eq!(fetcher.fetch(" ").await, None);
        assert_eq!(provider.calls(), 0);
        assert_eq!(fetcher.cache().len(), 0);
    }

    #[tokio::test]
    async fn returns_most_recent_close() {
        let provider = Arc::new(MockProvider::with_close(Decimal::new(15000, 2)));
        let fetcher = fetcher_with(provider.clone());

        assert_eq!(fetcher.fetch("AAPL").await, Some(Decimal::new(15000, 2)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn symbol_case_shares_one_entry() {
        let provider = Arc::new(MockProvider::with_close(Decimal::new(150, 0)));
        let fetcher = fetcher_with(provider.clone());

        let lower = fetcher.fetch("aapl").await;
        let upper = fetcher.fetch("AAPL").await;

        assert_eq!(lower, upper);
        assert_eq!(provider.calls(), 1);
        assert_eq!(fetcher.cache().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_once_ttl_elapses() {
        let provider = Arc::new(MockProvider::with_close(Decimal::new(150, 0)));
        let fetcher = fetcher_with(provider.clone());

        assert_eq!(fetcher.fetch("AAPL").await, Some(Decimal::new(150, 0)));
        provider.set_close(Decimal::new(151, 0));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(fetcher.fetch("AAPL").await, Some(Decimal::new(150, 0)));
        assert_eq!(provider.calls(), 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(fetcher.fetch("AAPL").await, Some(Decimal::new(151, 0)));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn empty_history_is_absent_and_cached() {
        let provider = Arc::new(MockProvider::empty());
        let fetcher = fetcher_with(provider.clone());

        assert_eq!(fetcher.fetch("ZZZZINVALID").await, None);
        assert_eq!(fetcher.fetch("zzzzinvalid").await, None);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn provider_failure_is_absent_and_retried() {
        let provider = Arc::new(MockProvider::failing());
        let fetcher = fetcher_with(provider.clone());

        assert_eq!(fetcher.fetch("AAPL").await, None);
        assert_eq!(fetcher.fetch("AAPL").await, None);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_provider_call() {
        let provider = Arc::new(MockProvider::with_close(Decimal::new(150, 0)).delayed(Duration::from_secs(2)));
        let fetcher = fetcher_with(provider.clone());

        let (a, b) = tokio::join!(fetcher.fetch("AAPL"), fetcher.fetch("aapl"));

        assert_eq!(a, Some(Decimal::new(150, 0)));
        assert_eq!(b, a);
        assert_eq!(provider.calls(), 1);
        assert!(fetcher.inflight.is_empty());
    }
}
