pub mod coingecko;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Price, market cap, volume and change for one coin in one currency.
///
/// Every metric is optional: the API omits fields it has no data for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinQuote {
    pub coin_id: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub change_24h_pct: Option<f64>,
}

impl CoinQuote {
    /// A quote with no metrics, used as a presence marker.
    pub fn empty(coin_id: impl Into<String>) -> Self {
        Self {
            coin_id: coin_id.into(),
            ..Self::default()
        }
    }
}

/// Outcome of looking up a single coin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    Found(CoinQuote),
    NotFound { coin_id: String },
}

impl Lookup {
    pub fn coin_id(&self) -> &str {
        match self {
            Self::Found(quote) => &quote.coin_id,
            Self::NotFound { coin_id } => coin_id,
        }
    }

    pub fn quote(&self) -> Option<&CoinQuote> {
        match self {
            Self::Found(quote) => Some(quote),
            Self::NotFound { .. } => None,
        }
    }
}

/// Trait implemented by price data providers.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Fetch quotes for `coin_ids` in `currency`.
    ///
    /// Returns exactly one [`Lookup`] per distinct normalized coin id, in the
    /// order the ids were first given.
    async fn fetch(&self, coin_ids: &[String], currency: &str) -> Result<Vec<Lookup>>;
}

/// Trim and lowercase coin ids, dropping empties and repeats.
pub fn normalize_coin_ids<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(raw.len());
    for id in raw {
        let id = id.as_ref().trim().to_lowercase();
        if id.is_empty() || ids.contains(&id) {
            continue;
        }
        ids.push(id);
    }
    ids
}

/// Split a comma-separated coin list into normalized ids.
pub fn parse_coin_list(input: &str) -> Vec<String> {
    let parts: Vec<&str> = input.split(',').collect();
    normalize_coin_ids(&parts)
}

/// Normalize a currency code, falling back to `default` when blank.
pub fn normalize_currency(raw: &str, default: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        default.trim().to_lowercase()
    } else {
        trimmed.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coin_list_trims_lowercases_and_drops_empties() {
        assert_eq!(
            parse_coin_list(" Bitcoin, ,ETHEREUM,,dogecoin "),
            vec!["bitcoin", "ethereum", "dogecoin"]
        );
    }

    #[test]
    fn parse_coin_list_of_only_separators_is_empty() {
        assert!(parse_coin_list(" , ,, ").is_empty());
        assert!(parse_coin_list("").is_empty());
    }

    #[test]
    fn normalize_coin_ids_removes_case_insensitive_duplicates() {
        let raw = vec!["btc", "BTC", "eth", " btc "];
        assert_eq!(normalize_coin_ids(&raw), vec!["btc", "eth"]);
    }

    #[test]
    fn normalize_currency_defaults_when_blank() {
        assert_eq!(normalize_currency("", "usd"), "usd");
        assert_eq!(normalize_currency("   ", "EUR"), "eur");
        assert_eq!(normalize_currency(" GBP ", "usd"), "gbp");
    }

    #[test]
    fn lookup_accessors() {
        let found = Lookup::Found(CoinQuote::empty("bitcoin"));
        let missing = Lookup::NotFound {
            coin_id: "doge".to_string(),
        };
        assert_eq!(found.coin_id(), "bitcoin");
        assert!(found.quote().is_some());
        assert_eq!(missing.coin_id(), "doge");
        assert!(missing.quote().is_none());
    }
}
