//! Single-shot "get prices" action.
//!
//! A [`PriceForm`] holds the two inputs, [`get_prices`] turns it into a
//! [`Report`] of tagged text segments, and [`ReportLog`] appends the plain
//! text of successful reports to a write-only log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::error::Result;
use crate::format::format_value;
use crate::provider::{CoinQuote, Lookup, PriceProvider, normalize_currency, parse_coin_list};

pub const DEFAULT_COINS: &str = "bitcoin, ethereum, dogecoin";

const SEPARATOR_WIDTH: usize = 50;

/// Input fields of the price form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceForm {
    pub coins: String,
    pub currency: String,
}

impl Default for PriceForm {
    fn default() -> Self {
        Self {
            coins: DEFAULT_COINS.to_string(),
            currency: crate::config::DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Display category of a report segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Timestamp,
    Heading,
    Price,
    MarketCap,
    Volume,
    Change,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub tag: Tag,
}

/// Tagged text produced by one invocation of the form action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    segments: Vec<Segment>,
    failed: bool,
}

impl Report {
    fn push(&mut self, tag: Tag, text: impl Into<String>) {
        self.segments.push(Segment {
            text: text.into(),
            tag,
        });
    }

    fn failure(message: impl Into<String>) -> Self {
        let mut report = Self {
            failed: true,
            ..Self::default()
        };
        report.push(Tag::Error, format!("{}\n", message.into()));
        report
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the action was rejected or the fetch failed.
    pub fn is_failure(&self) -> bool {
        self.failed
    }

    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Run the form action: validate, fetch, and lay out the report.
pub async fn get_prices(
    form: &PriceForm,
    provider: &dyn PriceProvider,
    now: DateTime<Local>,
) -> Report {
    let coins = parse_coin_list(&form.coins);
    if coins.is_empty() {
        return Report::failure("⚠️ Please enter at least one cryptocurrency.");
    }

    let currency = normalize_currency(&form.currency, crate::config::DEFAULT_CURRENCY);
    let lookups = match provider.fetch(&coins, &currency).await {
        Ok(lookups) => lookups,
        Err(err) => {
            warn!(error = %err, provider = provider.name(), "report fetch failed");
            return Report::failure(format!("Error fetching data: {}", err));
        }
    };

    debug!(coins = lookups.len(), currency = %currency, "building report");

    let mut report = Report::default();
    report.push(
        Tag::Timestamp,
        format!("📅 {}\n\n", now.format("%Y-%m-%d %H:%M:%S")),
    );
    for lookup in &lookups {
        match lookup {
            Lookup::Found(quote) => push_quote(&mut report, quote, &currency),
            Lookup::NotFound { coin_id } => {
                report.push(Tag::Error, format!("❌ {} not found.\n\n", coin_id));
            }
        }
    }
    report
}

fn push_quote(report: &mut Report, quote: &CoinQuote, currency: &str) {
    let cur = currency.to_uppercase();
    report.push(
        Tag::Heading,
        format!("📈 {} Price Tracker\n", quote.coin_id.to_uppercase()),
    );
    report.push(
        Tag::Price,
        format!("💰 Current Price: {} {}\n", format_value(quote.price, false), cur),
    );
    report.push(
        Tag::MarketCap,
        format!("🏦 Market Cap: {} {}\n", format_value(quote.market_cap, false), cur),
    );
    report.push(
        Tag::Volume,
        format!("📊 24h Volume: {} {}\n", format_value(quote.volume_24h, false), cur),
    );
    report.push(
        Tag::Change,
        format!("📉 24h Change: {}\n\n", format_value(quote.change_24h_pct, true)),
    );
}

/// Append-only log of rendered reports. Never read back.
#[derive(Debug, Clone)]
pub struct ReportLog {
    path: PathBuf,
}

impl ReportLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a successful report. Failed or rejected reports are not logged;
    /// returns whether anything was written.
    pub fn record(&self, report: &Report) -> Result<bool> {
        if report.is_failure() {
            debug!(path = %self.path.display(), "not logging failed report");
            return Ok(false);
        }
        self.append(&report.plain_text())?;
        Ok(true)
    }

    /// Append `text` followed by a dashed separator line.
    pub fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{}\n{}\n\n", text, "-".repeat(SEPARATOR_WIDTH))?;
        debug!(path = %self.path.display(), bytes = text.len(), "appended report");
        Ok(())
    }
}
