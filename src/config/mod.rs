use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use rust_decimal::Decimal;

use crate::session::refresh::{MAX_REFRESH_MINUTES, is_valid_refresh_minutes};

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_REFRESH_MINUTES: &str = "5.0";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_PROVIDER_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub symbol: String,
    pub shares: u64,
    pub refresh_minutes: Decimal,
    pub cache_ttl: Duration,
    pub provider_url: String,
    pub http_timeout: Duration,
    /// Prometheus exporter listen address. No exporter when unset.
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, applying defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let symbol = lookup("STOCK_VALUE_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        let shares = match lookup("STOCK_VALUE_SHARES") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("STOCK_VALUE_SHARES must be a non-negative integer, got {raw:?}"))?,
            None => 0,
        };

        let raw_refresh = lookup("STOCK_VALUE_REFRESH_MINUTES")
            .unwrap_or_else(|| DEFAULT_REFRESH_MINUTES.to_string());
        let refresh_minutes = raw_refresh
            .trim()
            .parse::<Decimal>()
            .with_context(|| format!("STOCK_VALUE_REFRESH_MINUTES must be a decimal, got {raw_refresh:?}"))?;
        if !is_valid_refresh_minutes(refresh_minutes) {
            bail!("STOCK_VALUE_REFRESH_MINUTES must be between 0 and {MAX_REFRESH_MINUTES}, got {refresh_minutes}");
        }

        let cache_ttl = Duration::from_secs(parse_secs(
            &lookup,
            "STOCK_VALUE_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);

        let provider_url = lookup("STOCK_VALUE_PROVIDER_URL")
            .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let http_timeout = Duration::from_secs(parse_secs(
            &lookup,
            "STOCK_VALUE_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let metrics_addr = lookup("STOCK_VALUE_METRICS_ADDR")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                raw.trim()
                    .parse::<SocketAddr>()
                    .with_context(|| format!("STOCK_VALUE_METRICS_ADDR must be host:port, got {raw:?}"))
            })
            .transpose()?;

        Ok(Self {
            log_level,
            symbol,
            shares,
            refresh_minutes,
            cache_ttl,
            provider_url,
            http_timeout,
            metrics_addr,
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}")),
        None => Ok(default),
    }
}
