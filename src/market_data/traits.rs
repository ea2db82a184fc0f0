use async_trait::async_trait;

use super::types::{Period, PriceBar, ProviderError};

/// Source of recent price history for a ticker.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns bars ordered oldest first. An empty vec means the provider
    /// knew the symbol but had nothing for the window.
    async fn get_recent_bars(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>, ProviderError>;
}
