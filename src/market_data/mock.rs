use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::traits::MarketDataProvider;
use super::types::{Period, PriceBar, ProviderError};

#[derive(Debug, Clone)]
enum Reply {
    Close(Decimal),
    Empty,
    Fail,
}

/// Scriptable provider that counts calls.
pub struct MockProvider {
    reply: Mutex<Reply>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn with_close(close: Decimal) -> Self {
        Self::new(Reply::Close(close))
    }

    pub fn empty() -> Self {
        Self::new(Reply::Empty)
    }

    pub fn failing() -> Self {
        Self::new(Reply::Fail)
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_close(&self, close: Decimal) {
        *self.reply.lock().unwrap() = Reply::Close(close);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_recent_bars(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>, ProviderError> {
        assert_eq!(period, Period::OneDay);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Close(close) => Ok(vec![
                PriceBar { timestamp: 1, close: close - Decimal::ONE },
                PriceBar { timestamp: 2, close },
            ]),
            Reply::Empty => Ok(Vec::new()),
            Reply::Fail => Err(ProviderError::Malformed(format!("scripted failure for {symbol}"))),
        }
    }
}
