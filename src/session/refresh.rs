use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

const MS_PER_MINUTE: i64 = 60_000;

/// Longest accepted refresh interval: one year.
pub const MAX_REFRESH_MINUTES: i64 = 525_600;

/// Whether `minutes` is an acceptable refresh setting (`0` included).
pub fn is_valid_refresh_minutes(minutes: Decimal) -> bool {
    (minutes.is_zero() || minutes.is_sign_positive()) && minutes <= Decimal::from(MAX_REFRESH_MINUTES)
}

/// Periodic re-evaluation interval for `minutes`, truncated to whole
/// milliseconds. `None` disables the timer, including when the product
/// does not fit.
pub fn refresh_interval(minutes: Decimal) -> Option<Duration> {
    let ms = minutes
        .checked_mul(Decimal::from(MS_PER_MINUTE))?
        .trunc()
        .to_u64()?;
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Optional repeating timer. While disabled, `tick` never completes.
#[derive(Debug)]
pub struct RefreshTimer {
    interval: Option<Interval>,
}

impl RefreshTimer {
    pub fn new(minutes: Decimal) -> Self {
        let mut timer = Self { interval: None };
        timer.reschedule(minutes);
        timer
    }

    /// Replaces the schedule. The first tick lands one full period from now.
    pub fn reschedule(&mut self, minutes: Decimal) {
        self.interval = refresh_interval(minutes).map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
    }

    pub fn period(&self) -> Option<Duration> {
        self.interval.as_ref().map(Interval::period)
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}
