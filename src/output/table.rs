use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::format::format_value;
use crate::history::{HistoryFormat, HistoryRecord};
use crate::provider::{CoinQuote, Lookup};

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Coin")]
    coin: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Market Cap")]
    market_cap: String,
    #[tabled(rename = "24h Volume")]
    volume: String,
    #[tabled(rename = "24h Change")]
    change_24h: String,
}

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Coin")]
    coin: String,
}

/// Render the in-memory history as a styled table.
pub fn history_table(record: &HistoryRecord, format: HistoryFormat) -> String {
    match format {
        HistoryFormat::Full => {
            let rows: Vec<HistoryRow> = record
                .iter()
                .map(|q| HistoryRow {
                    coin: q.coin_id.clone(),
                    price: format_value(q.price, false),
                    market_cap: format_value(q.market_cap, false),
                    volume: format_value(q.volume_24h, false),
                    change_24h: colored_change(q.change_24h_pct),
                })
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        HistoryFormat::Names => {
            let rows: Vec<NameRow> = record
                .iter()
                .map(|q| NameRow {
                    coin: q.coin_id.clone(),
                })
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
    }
}

/// Render the "price tracker" block for one lookup.
pub fn lookup_block(lookup: &Lookup, currency: &str) -> String {
    match lookup {
        Lookup::Found(quote) => quote_block(quote, currency),
        Lookup::NotFound { coin_id } => not_found_line(coin_id),
    }
}

fn not_found_line(coin_id: &str) -> String {
    format!("❌ {} not found.", coin_id).red().to_string()
}

fn quote_block(quote: &CoinQuote, currency: &str) -> String {
    let cur = currency.to_uppercase();
    format!(
        "\n📈 {}\n💰 Current Price: {} {}\n🏦 Market Cap: {} {}\n📊 24h Volume: {} {}\n📉 24h Change: {}",
        format!("{} Price Tracker", quote.coin_id.to_uppercase()).bold(),
        format_value(quote.price, false),
        cur,
        format_value(quote.market_cap, false),
        cur,
        format_value(quote.volume_24h, false),
        cur,
        colored_change(quote.change_24h_pct),
    )
}

fn colored_change(change: Option<f64>) -> String {
    let text = format_value(change, true);
    match change {
        Some(c) if c >= 0.0 => text.green().to_string(),
        Some(_) => text.red().to_string(),
        None => text.dimmed().to_string(),
    }
}
