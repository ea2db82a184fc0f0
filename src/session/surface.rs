use std::io::{self, Write};

use crate::session::input::InputState;
use crate::valuation::display::{View, Widget};

/// Where evaluated views end up.
pub trait Surface: Send {
    fn render(&mut self, input: &InputState, view: &View) -> io::Result<()>;

    /// Out-of-band message such as usage help or a rejected command.
    fn notice(&mut self, message: &str) -> io::Result<()>;
}

/// Plain-text rendering onto any writer, stdout in the binary.
pub struct TerminalSurface<W: Write + Send> {
    out: W,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Surface for TerminalSurface<W> {
    fn render(&mut self, input: &InputState, view: &View) -> io::Result<()> {
        writeln!(self.out)?;
        for widget in &view.widgets {
            match widget {
                Widget::Title(title) => {
                    writeln!(self.out, "{title}")?;
                    writeln!(self.out, "{}", "=".repeat(title.chars().count()))?;
                    writeln!(self.out, "{input}")?;
                    writeln!(self.out)?;
                }
                Widget::Heading(text) => writeln!(self.out, "{text}")?,
                Widget::Metric { label, value } => writeln!(self.out, "  {label:<22} {value}")?,
                Widget::Warning(text) => writeln!(self.out, "WARNING: {text}")?,
                Widget::Error(text) => writeln!(self.out, "ERROR: {text}")?,
                Widget::Caption(text) => writeln!(self.out, "  ({text})")?,
                Widget::Text(text) => writeln!(self.out, "{text}")?,
            }
        }
        self.out.flush()
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "> {message}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn renders_controls_and_metrics() {
        let input = InputState {
            symbol: "aapl".to_string(),
            shares: 10,
            refresh_minutes: Decimal::new(50, 1),
        };
        let view = View {
            widgets: vec![
                Widget::Title("Stock Market Value".to_string()),
                Widget::Heading("AAPL".to_string()),
                Widget::Metric {
                    label: "Market Value".to_string(),
                    value: "$1,500.00".to_string(),
                },
                Widget::Error("boom".to_string()),
            ],
        };

        let mut surface = TerminalSurface::new(Vec::new());
        surface.render(&input, &view).unwrap();
        let text = String::from_utf8(surface.into_inner()).unwrap();

        assert!(text.contains("Stock Market Value\n==================\n"));
        assert!(text.contains("Ticker: aapl | Shares: 10 | Refresh (minutes): 5.0"));
        assert!(text.contains("  Market Value           $1,500.00\n"));
        assert!(text.contains("ERROR: boom"));
    }
}
