// ⚙️ Configuration
// Environment-driven settings with defaults for every knob.

use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BLINK_ENDPOINT: &str = "https://api.blink.sv/graphql";
pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Runtime configuration.
///
/// | Variable               | Default                            |
/// |------------------------|------------------------------------|
/// | `BLINK_TOKEN`          | unset (live mode needs it)         |
/// | `BLINK_ENDPOINT`       | `https://api.blink.sv/graphql`     |
/// | `COINGECKO_BASE_URL`   | `https://api.coingecko.com/api/v3` |
/// | `COINGECKO_API_KEY`    | unset                              |
/// | `PRICE_CURRENCY`       | `eur` (default for price lookups)  |
/// | `FALLBACK_PRICE`       | `52000`                            |
/// | `COFFEE_PRICE_EUR`     | `2.50`                             |
/// | `COFFEE_MARGIN_EUR`    | `0.30`                             |
/// | `PAGE_SIZE`            | `100`                              |
/// | `MAX_PAGES`            | `50`                               |
/// | `MAX_RETRIES`          | `3`                                |
/// | `RETRY_BACKOFF_MS`     | `1000`                             |
/// | `REQUEST_TIMEOUT_SECS` | `30`                               |
/// | `EARLIEST_DATE`        | `2025-02-11`                       |
/// | `CACHE_TTL_SECS`       | `300`                              |
/// | `BIND_ADDR`            | `0.0.0.0:3000`                     |
#[derive(Debug, Clone)]
pub struct Config {
    pub blink_token: Option<String>,
    pub blink_endpoint: String,
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    pub price_currency: String,
    pub fallback_price: f64,
    pub coffee_price: f64,
    pub coffee_margin: f64,
    pub page_size: u32,
    pub max_pages: usize,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub request_timeout: Duration,
    pub earliest_date: NaiveDate,
    /// How long a dashboard snapshot is served before it is rebuilt
    pub cache_ttl: Duration,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            blink_token: None,
            blink_endpoint: DEFAULT_BLINK_ENDPOINT.to_string(),
            coingecko_base_url: DEFAULT_COINGECKO_BASE_URL.to_string(),
            coingecko_api_key: None,
            price_currency: "eur".to_string(),
            fallback_price: 52_000.0,
            coffee_price: 2.50,
            coffee_margin: 0.30,
            page_size: 100,
            max_pages: 50,
            max_retries: 3,
            retry_backoff: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            earliest_date: default_earliest_date(),
            cache_ttl: Duration::from_secs(300),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

fn default_earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 11).unwrap_or(NaiveDate::MIN)
}

impl Config {
    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Config {
            blink_token: get("BLINK_TOKEN"),
            blink_endpoint: get("BLINK_ENDPOINT").unwrap_or(defaults.blink_endpoint),
            coingecko_base_url: get("COINGECKO_BASE_URL").unwrap_or(defaults.coingecko_base_url),
            coingecko_api_key: get("COINGECKO_API_KEY"),
            price_currency: get("PRICE_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(defaults.price_currency),
            fallback_price: parse_or(
                "FALLBACK_PRICE",
                get("FALLBACK_PRICE"),
                defaults.fallback_price,
            )?,
            coffee_price: parse_or(
                "COFFEE_PRICE_EUR",
                get("COFFEE_PRICE_EUR"),
                defaults.coffee_price,
            )?,
            coffee_margin: parse_or(
                "COFFEE_MARGIN_EUR",
                get("COFFEE_MARGIN_EUR"),
                defaults.coffee_margin,
            )?,
            page_size: parse_or("PAGE_SIZE", get("PAGE_SIZE"), defaults.page_size)?,
            max_pages: parse_or("MAX_PAGES", get("MAX_PAGES"), defaults.max_pages)?,
            max_retries: parse_or("MAX_RETRIES", get("MAX_RETRIES"), defaults.max_retries)?,
            retry_backoff: Duration::from_millis(parse_or(
                "RETRY_BACKOFF_MS",
                get("RETRY_BACKOFF_MS"),
                defaults.retry_backoff.as_millis() as u64,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )?),
            earliest_date: match get("EARLIEST_DATE") {
                Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                    DashboardError::config(format!("EARLIEST_DATE '{}': {}", raw, e))
                })?,
                None => defaults.earliest_date,
            },
            cache_ttl: Duration::from_secs(parse_or(
                "CACHE_TTL_SECS",
                get("CACHE_TTL_SECS"),
                defaults.cache_ttl.as_secs(),
            )?),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }

    pub fn has_token(&self) -> bool {
        self.blink_token.is_some()
    }

    /// Token for the wallet API, or a config error naming the variable.
    pub fn require_token(&self) -> Result<&str> {
        self.blink_token
            .as_deref()
            .ok_or_else(|| DashboardError::config("BLINK_TOKEN is not set"))
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| DashboardError::config(format!("{} '{}': {}", key, value, e))),
        None => Ok(default),
    }
}
