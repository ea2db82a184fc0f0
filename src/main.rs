mod config;
mod market_data;
mod session;
mod state;
mod telemetry;
mod valuation;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use config::Config;
use market_data::adapters::yahoo::YahooChartProvider;
use session::input::InputState;
use session::surface::TerminalSurface;
use session::{Session, stdin};
use state::price_cache::PriceCache;
use valuation::fetch::PriceFetcher;

/// Lines typed ahead of the event loop. A person at a keyboard never fills this.
const INPUT_CHANNEL_BUFFER: usize = 64;

fn init_tracing(config: &Config) {
    // Logs go to stderr so they stay out of the rendered view on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    if let Some(addr) = config.metrics_addr {
        telemetry::init_metrics_server(addr)?;
        info!(%addr, "metrics exporter listening");
    }

    info!(provider = %config.provider_url, ttl_secs = config.cache_ttl.as_secs(), "stock-value starting");

    let provider = YahooChartProvider::new(&config.provider_url, config.http_timeout)?;
    // Shared by every session in the process; clones are an Arc bump.
    let cache = PriceCache::new(config.cache_ttl);
    let fetcher = PriceFetcher::new(Arc::new(provider), cache);

    let input = InputState {
        symbol: config.symbol.clone(),
        shares: config.shares,
        refresh_minutes: config.refresh_minutes,
    };

    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_BUFFER);
    let session = Session::new(input, fetcher, TerminalSurface::stdout());

    // Detached: the thread ends with the process.
    stdin::spawn_stdin_reader(tx)?;
    let session_handle = tokio::spawn(session.run(rx));

    tokio::select! {
        res = session_handle => {
            if let Err(err) = res {
                warn!(error = %err, "session task panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl-C, shutting down");
        }
    }

    Ok(())
}
