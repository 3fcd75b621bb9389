// 💶 BTC Price - CoinGecko simple price API with a fixed fallback

use crate::config::Config;
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceOrigin {
    CoinGecko,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Upper-case fiat code, e.g. `EUR`
    pub currency: String,
    pub price: f64,
    pub last_updated: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub source: PriceOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PriceQuote {
    pub fn fallback(currency: &str, price: f64, error: impl Into<String>) -> Self {
        let now = Utc::now();
        PriceQuote {
            currency: currency.to_uppercase(),
            price,
            last_updated: now,
            fetched_at: now,
            source: PriceOrigin::Fallback,
            error: Some(error.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == PriceOrigin::Fallback
    }
}

/// Prices for several currencies from one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub prices: BTreeMap<String, f64>,
    pub last_updated: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, currency: &str) -> Result<PriceQuote>;
}

/// Live quote, or a fallback quote carrying the failure message.
pub async fn price_or_fallback(
    source: &dyn PriceSource,
    currency: &str,
    fallback_price: f64,
) -> PriceQuote {
    match source.fetch_price(currency).await {
        Ok(quote) => quote,
        Err(e) => {
            warn!("Price lookup for {} failed, using fallback {}: {}", currency, fallback_price, e);
            PriceQuote::fallback(currency, fallback_price, e.to_string())
        }
    }
}

// ============================================================================
// COINGECKO CLIENT
// ============================================================================

/// `{"bitcoin": {"eur": 52000.0, "last_updated_at": 1757667600}}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(CoinGeckoClient {
            client,
            base_url: config.coingecko_base_url.trim_end_matches('/').to_string(),
            api_key: config.coingecko_api_key.clone(),
        })
    }

    async fn simple_price(&self, currencies: &str) -> Result<HashMap<String, f64>> {
        let url = format!("{}/simple/price", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("ids", "bitcoin"),
                ("vs_currencies", currencies),
                ("include_last_updated_at", "true"),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                service: "CoinGecko",
                status: status.as_u16(),
            });
        }

        let mut body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| DashboardError::decode(format!("CoinGecko response: {}", e)))?;

        body.remove("bitcoin")
            .ok_or_else(|| DashboardError::price("response has no bitcoin entry"))
    }

    /// Several currencies in one call, e.g. `["eur", "usd"]`.
    pub async fn fetch_prices(&self, currencies: &[&str]) -> Result<PriceTable> {
        let wanted: Vec<String> = currencies.iter().map(|c| c.trim().to_lowercase()).collect();
        let mut entry = self.simple_price(&wanted.join(",")).await?;
        let last_updated = last_updated(entry.remove("last_updated_at"));

        let prices: BTreeMap<String, f64> = wanted
            .iter()
            .filter_map(|c| entry.get(c).map(|p| (c.to_uppercase(), *p)))
            .collect();
        if prices.is_empty() {
            return Err(DashboardError::price(format!("no prices for {}", wanted.join(","))));
        }

        Ok(PriceTable {
            prices,
            last_updated,
            fetched_at: Utc::now(),
        })
    }
}

fn last_updated(raw: Option<f64>) -> DateTime<Utc> {
    raw.and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single())
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_price(&self, currency: &str) -> Result<PriceQuote> {
        let currency = currency.trim().to_lowercase();
        let entry = self.simple_price(&currency).await?;

        let price = entry
            .get(&currency)
            .copied()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| DashboardError::price(format!("price for {} not available", currency)))?;

        Ok(PriceQuote {
            currency: currency.to_uppercase(),
            price,
            last_updated: last_updated(entry.get("last_updated_at").copied()),
            fetched_at: Utc::now(),
            source: PriceOrigin::CoinGecko,
            error: None,
        })
    }
}
