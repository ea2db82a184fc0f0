use chrono::{DateTime, Local};
use rust_decimal::{Decimal, RoundingStrategy};

pub const TITLE: &str = "Stock Market Value (Auto-Refresh)";
pub const EMPTY_SYMBOL_MESSAGE: &str = "Enter a ticker.";
pub const PRICE_UNAVAILABLE_MESSAGE: &str = "Invalid ticker or no price available.";
pub const VALUE_OVERFLOW_MESSAGE: &str = "Market value is too large to display.";
pub const PRICE_LABEL: &str = "Last Price (delayed)";
pub const MARKET_VALUE_LABEL: &str = "Market Value";
pub const DELAY_NOTE: &str = "Prices are typically delayed ~15 minutes.";
pub const REFRESH_TIP: &str = "Tip: Set Refresh (minutes) to 0 to disable auto-refresh.";

/// Declarative pieces of the rendered view, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Title(String),
    Heading(String),
    Metric { label: String, value: String },
    Warning(String),
    Error(String),
    Caption(String),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub widgets: Vec<Widget>,
}

impl View {
    fn push(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }

    #[cfg(test)]
    pub fn metric(&self, label: &str) -> Option<&str> {
        self.widgets.iter().find_map(|w| match w {
            Widget::Metric { label: l, value } if l == label => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Outcome of valuing a holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Valuation {
    EmptySymbol,
    PriceUnavailable,
    /// `price × shares` does not fit in a decimal.
    ValueOverflow,
    Priced {
        symbol: String,
        price: Decimal,
        market_value: Decimal,
    },
}

impl Valuation {
    pub fn compute(symbol: &str, shares: u64, price: Option<Decimal>) -> Self {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Valuation::EmptySymbol;
        }
        let Some(price) = price else {
            return Valuation::PriceUnavailable;
        };

        let Some(market_value) = price.checked_mul(Decimal::from(shares)) else {
            return Valuation::ValueOverflow;
        };

        Valuation::Priced {
            symbol: symbol.to_uppercase(),
            price,
            market_value,
        }
    }
}

/// Builds the view for one evaluation pass. `now` is stamped verbatim.
pub fn evaluate(symbol: &str, shares: u64, price: Option<Decimal>, now: DateTime<Local>) -> View {
    let mut view = View::default();
    view.push(Widget::Title(TITLE.to_string()));

    match Valuation::compute(symbol, shares, price) {
        Valuation::EmptySymbol => view.push(Widget::Warning(EMPTY_SYMBOL_MESSAGE.to_string())),
        Valuation::PriceUnavailable => view.push(Widget::Error(PRICE_UNAVAILABLE_MESSAGE.to_string())),
        Valuation::ValueOverflow => view.push(Widget::Error(VALUE_OVERFLOW_MESSAGE.to_string())),
        Valuation::Priced {
            symbol,
            price,
            market_value,
        } => {
            view.push(Widget::Heading(symbol));
            view.push(Widget::Metric {
                label: PRICE_LABEL.to_string(),
                value: format_usd(price),
            });
            view.push(Widget::Metric {
                label: MARKET_VALUE_LABEL.to_string(),
                value: format_usd(market_value),
            });
        }
    }

    view.push(Widget::Caption(DELAY_NOTE.to_string()));
    view.push(Widget::Text(format!("Last update: {}", now.format("%Y-%m-%d %H:%M:%S"))));
    view.push(Widget::Caption(REFRESH_TIP.to_string()));
    view
}

/// `$1,234.57` style: two decimals, half away from zero, comma thousands.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}
