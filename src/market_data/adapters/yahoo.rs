use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::debug;

use crate::market_data::traits::MarketDataProvider;
use crate::market_data::types::{Period, PriceBar, ProviderError};
use crate::telemetry;

// The chart endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-value/0.1";

/// Yahoo Finance v8 chart API. Unauthenticated and delayed.
pub struct YahooChartProvider {
    client: Client,
    base_url: Url,
}

impl YahooChartProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid provider url {base_url:?}"))?;
        if base_url.cannot_be_a_base() {
            bail!("provider url {base_url} cannot carry a path");
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn chart_url(&self, symbol: &str, period: Period) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart", symbol]);
        }
        url.query_pairs_mut()
            .append_pair("range", period.as_str())
            .append_pair("interval", period.as_str());
        url
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn get_recent_bars(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>, ProviderError> {
        let url = self.chart_url(symbol, period);
        let started = Instant::now();

        let response = self.client.get(url).send().await?;
        let status = response.status();
        telemetry::record_provider_latency(self.name(), started.elapsed().as_secs_f64() * 1_000.0);

        debug!(symbol, %status, "chart response");

        // Unknown tickers come back as 404 with a chart.error body.
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NoData(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text().await?;
        parse_chart(symbol, &body)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turns a chart response body into bars, dropping bars without a close.
pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<Vec<PriceBar>, ProviderError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        debug!(
            symbol,
            code = err.code.as_deref().unwrap_or("unknown"),
            description = err.description.as_deref().unwrap_or(""),
            "chart error"
        );
        return Err(ProviderError::NoData(symbol.to_string()));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(ProviderError::NoData(symbol.to_string()));
    };

    // A symbol with no trades in the window has no quote series at all.
    let Some(series) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    if series.close.len() != result.timestamp.len() {
        return Err(ProviderError::Malformed(format!(
            "{} timestamps but {} closes",
            result.timestamp.len(),
            series.close.len()
        )));
    }

    let bars = result
        .timestamp
        .into_iter()
        .zip(series.close)
        .filter_map(|(timestamp, close)| {
            let close = close.and_then(Decimal::from_f64)?;
            Some(PriceBar { timestamp, close })
        })
        .collect();

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closes_oldest_first() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL"},
            "timestamp":[1700000000,1700086400],
            "indicators":{"quote":[{"close":[149.5,150.25],"open":[149.0,150.0]}]}}],"error":null}}"#;

        let bars = parse_chart("AAPL", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1700000000);
        assert_eq!(bars[1].close, Decimal::new(15025, 2));
    }

    #[test]
    fn drops_bars_with_null_close() {
        let body = r#"{"chart":{"result":[{"timestamp":[1,2,3],
            "indicators":{"quote":[{"close":[10.0,null,null]}]}}],"error":null}}"#;

        let bars = parse_chart("X", body).unwrap();
        assert_eq!(bars, vec![PriceBar { timestamp: 1, close: Decimal::new(10, 0) }]);
    }

    #[test]
    fn missing_quote_series_is_empty_history() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[]}}],"error":null}}"#;
        assert!(parse_chart("X", body).unwrap().is_empty());
    }

    #[test]
    fn chart_error_is_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse_chart("ZZZZINVALID", body), Err(ProviderError::NoData(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_chart("X", "<html>"), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn builds_chart_url() {
        let provider = YahooChartProvider::new("http://localhost:9999/", Duration::from_secs(1)).unwrap();
        let url = provider.chart_url("BRK-B", Period::OneDay);
        assert_eq!(url.as_str(), "http://localhost:9999/v8/finance/chart/BRK-B?range=1d&interval=1d");
    }
}
