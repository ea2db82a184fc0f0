use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use super::refresh::is_valid_refresh_minutes;

pub const USAGE: &str = "commands: ticker <SYMBOL> | shares <N> | interval <MINUTES> | now (or empty line) | help | quit";

/// Per-session control values. Survive every re-evaluation until edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputState {
    pub symbol: String,
    pub shares: u64,
    pub refresh_minutes: Decimal,
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticker: {} | Shares: {} | Refresh (minutes): {}",
            self.symbol, self.shares, self.refresh_minutes
        )
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetSymbol(String),
    SetShares(u64),
    SetRefreshMinutes(Decimal),
    RefreshNow,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{command} expects {expected}, got {got:?}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
        got: String,
    },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word.to_ascii_lowercase().as_str() {
            // Pressing enter is the "Refresh now" button.
            "" | "now" | "r" => Ok(Command::RefreshNow),
            "ticker" | "symbol" => Ok(Command::SetSymbol(rest.to_string())),
            "shares" => rest
                .parse::<u64>()
                .map(Command::SetShares)
                .map_err(|_| CommandError::BadArgument {
                    command: "shares",
                    expected: "a non-negative whole number",
                    got: rest.to_string(),
                }),
            "interval" => {
                let bad = || CommandError::BadArgument {
                    command: "interval",
                    expected: "minutes between 0 and 525600",
                    got: rest.to_string(),
                };
                let minutes = rest.parse::<Decimal>().map_err(|_| bad())?;
                if !is_valid_refresh_minutes(minutes) {
                    return Err(bad());
                }
                Ok(Command::SetRefreshMinutes(minutes))
            }
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(word.to_string())),
        }
    }
}
