use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

use super::{CoinQuote, Lookup, PriceProvider, normalize_coin_ids};
use crate::error::{Error, Result};

pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";

const USER_AGENT: &str = concat!("cryptotrack/", env!("CARGO_PKG_VERSION"));

/// CoinGecko price provider -- free public API, no key required.
pub struct CoinGecko {
    client: Client,
    base_url: String,
}

impl CoinGecko {
    /// Create a CoinGecko provider using the default production API URL.
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Create a CoinGecko provider with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                debug!(error = %err, "falling back to default HTTP client");
                Client::new()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CoinGecko {
    fn default() -> Self {
        Self::new()
    }
}

/// CoinGecko `/simple/price` response shape.
/// Example: `{ "bitcoin": { "usd": 50000, "usd_24h_vol": 2.1e10, "usd_market_cap": 9.5e11 } }`
///
/// Values stay untyped so that `null` or odd fields degrade to "absent", and a
/// key that is not a coin object never fails the whole response.
type SimplePrice = HashMap<String, Value>;

#[async_trait]
impl PriceProvider for CoinGecko {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch(&self, coin_ids: &[String], currency: &str) -> Result<Vec<Lookup>> {
        let ids = normalize_coin_ids(coin_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids_param = ids.join(",");
        let cur = currency.trim().to_lowercase();
        let url = format!("{}/simple/price", self.base_url);

        debug!(url = %url, ids = %ids_param, currency = %cur, "fetching prices from CoinGecko");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("ids", ids_param.as_str()),
                ("vs_currencies", cur.as_str()),
                ("include_market_cap", "true"),
                ("include_24hr_vol", "true"),
                ("include_24hr_change", "true"),
            ])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        debug!(status = %status, body_len = body.len(), "CoinGecko response");
        trace!(body = %body, "CoinGecko response body");

        if !status.is_success() {
            return Err(Error::Api(format!(
                "CoinGecko returned {}: {}",
                status, body
            )));
        }

        parse_simple_price(&body, &ids, &cur)
    }
}

/// Map a `/simple/price` body onto one [`Lookup`] per requested id.
pub fn parse_simple_price(body: &str, ids: &[String], currency: &str) -> Result<Vec<Lookup>> {
    let data: SimplePrice = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("CoinGecko JSON: {}", e)))?;

    let cap_key = format!("{}_market_cap", currency);
    let vol_key = format!("{}_24h_vol", currency);
    let change_key = format!("{}_24h_change", currency);

    let lookups = ids
        .iter()
        .map(|id| match data.get(id).and_then(Value::as_object) {
            Some(fields) => Lookup::Found(CoinQuote {
                coin_id: id.clone(),
                price: number(fields, currency),
                market_cap: number(fields, &cap_key),
                volume_24h: number(fields, &vol_key),
                change_24h_pct: number(fields, &change_key),
            }),
            None => Lookup::NotFound {
                coin_id: id.clone(),
            },
        })
        .collect();

    Ok(lookups)
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(Value::as_f64)
}
