//! Flat-file history of coins checked from the console.
//!
//! Two on-disk formats are supported. The full format stores one
//! `coin_id,price,market_cap,volume_24h,change_24h` line per coin, with an
//! empty field for a metric the API did not report. The name-only format
//! stores one coin id per line. Either way entries are written sorted by coin
//! id and a load never fails: bad lines are logged and skipped.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::provider::{CoinQuote, Lookup};

const FULL_FIELD_COUNT: usize = 5;

/// On-disk layout of the history file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFormat {
    /// Coin id plus the last known metrics.
    #[default]
    Full,
    /// Coin ids only.
    Names,
}

/// Last known quote per coin, keyed by lowercase coin id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRecord {
    entries: BTreeMap<String, CoinQuote>,
}

impl HistoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, coin_id: &str) -> Option<&CoinQuote> {
        self.entries.get(&coin_id.trim().to_lowercase())
    }

    /// Insert or replace the snapshot for `quote.coin_id`.
    pub fn insert(&mut self, mut quote: CoinQuote) {
        let key = quote.coin_id.trim().to_lowercase();
        quote.coin_id = key.clone();
        self.entries.insert(key, quote);
    }

    /// Record every found quote, replacing older snapshots. Returns how many
    /// entries were written.
    pub fn merge(&mut self, lookups: &[Lookup]) -> usize {
        let mut merged = 0;
        for quote in lookups.iter().filter_map(Lookup::quote) {
            self.insert(quote.clone());
            merged += 1;
        }
        merged
    }

    /// Entries sorted by coin id.
    pub fn iter(&self) -> impl Iterator<Item = &CoinQuote> {
        self.entries.values()
    }
}

/// Reads and writes a [`HistoryRecord`] at a fixed path.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    format: HistoryFormat,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, format: HistoryFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> HistoryFormat {
        self.format
    }

    /// Load the history file.
    ///
    /// A missing or unreadable file yields an empty record. Malformed lines
    /// are skipped with a warning.
    pub fn load(&self) -> HistoryRecord {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no previous history found");
                return HistoryRecord::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read history file");
                return HistoryRecord::new();
            }
        };

        let record = self.parse(&raw);
        debug!(path = %self.path.display(), entries = record.len(), "loaded history");
        record
    }

    /// Overwrite the history file with `record`, sorted by coin id.
    pub fn save(&self, record: &HistoryRecord) -> Result<()> {
        fs::write(&self.path, self.render(record))?;
        debug!(path = %self.path.display(), entries = record.len(), "saved history");
        Ok(())
    }

    fn parse(&self, raw: &str) -> HistoryRecord {
        let mut record = HistoryRecord::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parsed = match self.format {
                HistoryFormat::Full => parse_full_line(line),
                HistoryFormat::Names => parse_name_line(line),
            };

            match parsed {
                Ok(quote) => record.insert(quote),
                Err(reason) => {
                    warn!(
                        path = %self.path.display(),
                        line = idx + 1,
                        content = %line,
                        reason = %reason,
                        "skipping malformed history line"
                    );
                }
            }
        }
        record
    }

    fn render(&self, record: &HistoryRecord) -> String {
        let mut out = String::new();
        for quote in record.iter() {
            match self.format {
                HistoryFormat::Full => {
                    let _ = writeln!(
                        out,
                        "{},{},{},{},{}",
                        quote.coin_id,
                        literal(quote.price),
                        literal(quote.market_cap),
                        literal(quote.volume_24h),
                        literal(quote.change_24h_pct),
                    );
                }
                HistoryFormat::Names => {
                    let _ = writeln!(out, "{}", quote.coin_id);
                }
            }
        }
        out
    }
}

fn literal(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_full_line(line: &str) -> std::result::Result<CoinQuote, String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != FULL_FIELD_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            FULL_FIELD_COUNT,
            parts.len()
        ));
    }

    let coin_id = parts[0].to_lowercase();
    if coin_id.is_empty() {
        return Err("empty coin id".to_string());
    }

    Ok(CoinQuote {
        price: parse_metric(parts[1], "price")?,
        market_cap: parse_metric(parts[2], "market_cap")?,
        volume_24h: parse_metric(parts[3], "volume_24h")?,
        change_24h_pct: parse_metric(parts[4], "change_24h")?,
        coin_id,
    })
}

fn parse_name_line(line: &str) -> std::result::Result<CoinQuote, String> {
    if line.contains(',') {
        return Err("coin id contains a comma".to_string());
    }
    Ok(CoinQuote::empty(line.to_lowercase()))
}

fn parse_metric(raw: &str, field: &str) -> std::result::Result<Option<f64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{} is not a number: '{}'", field, raw))
}
