pub mod input;
pub mod refresh;
pub mod stdin;
pub mod surface;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::telemetry;
use crate::valuation::display::{self, View};
use crate::valuation::fetch::PriceFetcher;
use input::{Command, InputState, USAGE};
use refresh::RefreshTimer;
use surface::Surface;

/// What caused a re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Manual,
    Timer,
    Input,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::Manual => "manual",
            Trigger::Timer => "timer",
            Trigger::Input => "input",
        }
    }
}

/// One user's display loop: input state, a refresh timer, and a surface.
///
/// Every trigger re-runs the whole fetch + display pass. Passes never
/// overlap within a session since the loop awaits each one in turn.
pub struct Session<S: Surface> {
    input: InputState,
    fetcher: PriceFetcher,
    surface: S,
    timer: RefreshTimer,
}

impl<S: Surface> Session<S> {
    pub fn new(input: InputState, fetcher: PriceFetcher, surface: S) -> Self {
        let timer = RefreshTimer::new(input.refresh_minutes);
        Self {
            input,
            fetcher,
            surface,
            timer,
        }
    }

    #[cfg(test)]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Runs until `quit` or until the line source closes.
    pub async fn run(mut self, mut lines: mpsc::Receiver<String>) -> S {
        info!(
            symbol = %self.input.symbol,
            shares = self.input.shares,
            interval_ms = ?self.timer.period().map(|p| p.as_millis()),
            "session started"
        );

        self.evaluate(Trigger::Startup).await;

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        info!("input closed, ending session");
                        break;
                    };
                    if !self.handle_line(&line).await {
                        info!("quit requested, ending session");
                        break;
                    }
                }
                _ = self.timer.tick() => {
                    let purged = self.fetcher.cache().purge_expired();
                    if purged > 0 {
                        debug!(purged, "dropped expired cache entries");
                    }
                    self.evaluate(Trigger::Timer).await;
                }
            }
        }

        self.surface
    }

    /// Applies one input line. Returns `false` when the session should end.
    pub async fn handle_line(&mut self, line: &str) -> bool {
        match line.parse::<Command>() {
            Ok(command) => self.apply(command).await,
            Err(err) => {
                debug!(line, error = %err, "rejected command");
                self.notify(&format!("{err}; {USAGE}"));
                true
            }
        }
    }

    pub async fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::SetSymbol(symbol) => {
                self.input.symbol = symbol;
                self.evaluate(Trigger::Input).await;
            }
            Command::SetShares(shares) => {
                self.input.shares = shares;
                self.evaluate(Trigger::Input).await;
            }
            Command::SetRefreshMinutes(minutes) => {
                self.input.refresh_minutes = minutes;
                self.timer.reschedule(minutes);
                info!(
                    interval_ms = ?self.timer.period().map(|p| p.as_millis()),
                    "refresh timer rescheduled"
                );
                self.evaluate(Trigger::Input).await;
            }
            Command::RefreshNow => {
                self.evaluate(Trigger::Manual).await;
            }
            Command::Help => self.notify(USAGE),
            Command::Quit => return false,
        }
        true
    }

    /// One full pass: fetch, value, render.
    pub async fn evaluate(&mut self, trigger: Trigger) -> View {
        telemetry::record_evaluation(trigger.as_str());

        let price = self.fetcher.fetch(&self.input.symbol).await;
        let view = display::evaluate(&self.input.symbol, self.input.shares, price, Local::now());

        debug!(trigger = trigger.as_str(), symbol = %self.input.symbol, ?price, "evaluated");

        if let Err(err) = self.surface.render(&self.input, &view) {
            warn!(error = %err, "failed to render view");
        }
        view
    }

    fn notify(&mut self, message: &str) {
        if let Err(err) = self.surface.notice(message) {
            warn!(error = %err, "failed to write notice");
        }
    }
}
