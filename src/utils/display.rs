use crate::models::stock::{StockData, StockEntry};
use crate::models::ticker::TickerSymbol;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
        ));

        for row in rows {
            table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
        }

        table.to_string()
    }

    pub fn format_colored_change(&self, change: f64) -> String {
        if change >= 0.0 {
            format!("+{:.2}%", change).green().to_string()
        } else {
            format!("{:.2}%", change).red().to_string()
        }
    }

    pub fn format_currency(&self, amount: f64) -> String {
        if amount >= 1.0 {
            format!("${:.2}", amount)
        } else {
            format!("${:.6}", amount)
        }
    }

    /// 1.2T / 345.6B / 7.8M style abbreviation.
    pub fn format_large(&self, amount: f64) -> String {
        let abs = amount.abs();
        if abs >= 1e12 {
            format!("{:.2}T", amount / 1e12)
        } else if abs >= 1e9 {
            format!("{:.2}B", amount / 1e9)
        } else if abs >= 1e6 {
            format!("{:.2}M", amount / 1e6)
        } else {
            format!("{:.0}", amount)
        }
    }

    pub fn format_stock_summary(&self, data: &StockData, from_cache: bool) -> String {
        let info = &data.info_data;
        let name = info
            .long_name
            .as_deref()
            .or(info.short_name.as_deref())
            .unwrap_or(info.symbol.as_str());
        let mut title = format!("{} ({})", info.symbol, name);
        if from_cache {
            title.push_str(" [cached]");
        }

        let na = || "n/a".to_string();
        let mut output = vec![self.format_header(&title)];
        if let Some(exchange) = &info.exchange {
            output.push(format!("Exchange: {}", exchange));
        }
        if let (Some(sector), Some(industry)) = (&info.sector, &info.industry) {
            output.push(format!("Sector: {} / {}", sector, industry));
        }
        output.push(format!(
            "Price: {}",
            info.regular_market_price
                .map(|p| self.format_currency(p))
                .unwrap_or_else(na)
        ));
        output.push(format!(
            "Change: {}",
            info.regular_market_change_percent
                .map(|c| self.format_colored_change(c))
                .unwrap_or_else(na)
        ));
        if let (Some(low), Some(high)) = (info.day_low, info.day_high) {
            output.push(format!(
                "Day Range: {} - {}",
                self.format_currency(low),
                self.format_currency(high)
            ));
        }
        if let (Some(low), Some(high)) = (info.fifty_two_week_low, info.fifty_two_week_high) {
            output.push(format!(
                "52w Range: {} - {}",
                self.format_currency(low),
                self.format_currency(high)
            ));
        }
        output.push(format!(
            "Market Cap: {}",
            info.market_cap.map(|m| self.format_large(m)).unwrap_or_else(na)
        ));
        output.push(format!(
            "P/E: {}",
            info.trailing_pe.map(|pe| format!("{:.2}", pe)).unwrap_or_else(na)
        ));
        if let Some(yield_) = info.dividend_yield {
            output.push(format!("Dividend Yield: {:.2}%", yield_));
        }

        output.join("\n")
    }

    pub fn format_history(&self, entries: &[StockEntry]) -> String {
        let headers = &["Date", "Open", "High", "Low", "Close", "Volume"];
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|e| {
                vec![
                    e.date.clone(),
                    self.format_currency(e.open),
                    self.format_currency(e.high),
                    self.format_currency(e.low),
                    self.format_currency(e.close),
                    self.format_large(e.volume),
                ]
            })
            .collect();
        self.format_table(headers, &rows)
    }

    pub fn format_cache_listing(&self, entries: &[(TickerSymbol, u64)], now_millis: u64) -> String {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|(ticker, at)| {
                let age = now_millis.saturating_sub(*at) / 1000;
                vec![ticker.to_string(), format!("{}s", age)]
            })
            .collect();
        self.format_table(&["Ticker", "Age"], &rows)
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}
