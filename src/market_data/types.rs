use rust_decimal::Decimal;
use thiserror::Error;

/// History window requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneDay,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
        }
    }
}

/// One historical bar. Only the close is kept — it is all valuation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    /// Bar open time, unix seconds.
    pub timestamp: i64,
    pub close: Decimal,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("no data for symbol: {0}")]
    NoData(String),
}
