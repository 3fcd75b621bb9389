// 🧭 Dashboard Service
// Fetches balance, history and price in parallel, then derives everything the
// dashboard shows. Every fetch is best-effort: failures fall back to the last
// good value (or zero) and are reported in `errors`.

use crate::aggregate::{
    aggregate_daily_with, calculate_stats, outgoing_transactions, AggregatedStats, DailyData,
    OutgoingTx,
};
use crate::coffee::{calculate_coffee_stats, profit_loss, CoffeeEstimator, CoffeeStats};
use crate::config::Config;
use crate::convert::{round2, sats_to_btc, sats_to_fiat};
use crate::error::Result;
use crate::mock::MockWallet;
use crate::price::{price_or_fallback, CoinGeckoClient, PriceQuote, PriceSource};
use crate::transaction::{filter_by_range, TimeRange, WalletTransaction};
use crate::wallet::{BlinkClient, WalletBalance, WalletSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Dashboard figures are always in EUR: coffee price, margin and the `euros`
/// fields assume it. Other currencies are only served as price quotes.
pub const DASHBOARD_CURRENCY: &str = "eur";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub range: TimeRange,
    pub balance_sats: u64,
    pub balance_btc: f64,
    pub balance_fiat: f64,
    pub price: PriceQuote,
    pub daily: Vec<DailyData>,
    pub stats: AggregatedStats,
    pub coffee: CoffeeStats,
    pub profit_loss: f64,
    pub outgoing: Vec<OutgoingTx>,
    /// Transactions inside the range, any direction or status
    pub transaction_count: usize,
    pub last_update: DateTime<Utc>,
    pub errors: Vec<String>,
    pub mock: bool,
}

impl DashboardSnapshot {
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Last good inputs, reused when a later fetch fails.
#[derive(Default)]
struct Cache {
    balance: Option<WalletBalance>,
    transactions: Option<Vec<WalletTransaction>>,
    price: Option<PriceQuote>,
    snapshot: Option<DashboardSnapshot>,
}

pub struct DashboardService {
    wallet: Arc<dyn WalletSource>,
    prices: Arc<dyn PriceSource>,
    config: Config,
    estimator: CoffeeEstimator,
    cache: RwLock<Cache>,
}

impl DashboardService {
    pub fn new(
        wallet: Arc<dyn WalletSource>,
        prices: Arc<dyn PriceSource>,
        config: Config,
    ) -> Self {
        let estimator = CoffeeEstimator::with_price(config.coffee_price);
        DashboardService {
            wallet,
            prices,
            config,
            estimator,
            cache: RwLock::new(Cache::default()),
        }
    }

    /// Live Blink + CoinGecko clients, or the mock wallet when `mock` is set.
    pub fn from_config(config: Config, mock: bool) -> Result<Self> {
        let wallet: Arc<dyn WalletSource> = if mock {
            info!("Using mock wallet data");
            Arc::new(MockWallet::new(Utc::now()))
        } else {
            let client = BlinkClient::new(&config)?;
            info!("Using Blink wallet at {}", client.endpoint());
            Arc::new(client)
        };
        let prices: Arc<dyn PriceSource> = Arc::new(CoinGeckoClient::new(&config)?);

        Ok(Self::new(wallet, prices, config))
    }

    pub fn with_estimator(mut self, estimator: CoffeeEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_mock(&self) -> bool {
        self.wallet.is_mock()
    }

    pub fn price_source(&self) -> &dyn PriceSource {
        self.prices.as_ref()
    }

    pub async fn latest(&self) -> Option<DashboardSnapshot> {
        self.cache.read().await.snapshot.clone()
    }

    /// All-time snapshot from the cache, rebuilt once it is older than `cache_ttl`.
    pub async fn latest_or_refresh(&self) -> DashboardSnapshot {
        self.latest_or_refresh_at(TimeRange::AllTime, Utc::now()).await
    }

    /// Cached snapshot for `range` if it is still fresh at `now`, otherwise a new one.
    pub async fn latest_or_refresh_at(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> DashboardSnapshot {
        if let Some(snapshot) = self.latest().await {
            if snapshot.range == range && !self.is_stale(&snapshot, now) {
                return snapshot;
            }
            debug!(
                "Cached snapshot ({}, {}) not usable, refreshing",
                snapshot.range.label(),
                snapshot.last_update
            );
        }
        self.refresh_at(range, now).await
    }

    fn is_stale(&self, snapshot: &DashboardSnapshot, now: DateTime<Utc>) -> bool {
        match (now - snapshot.last_update).to_std() {
            Ok(age) => age > self.config.cache_ttl,
            // snapshot from the future
            Err(_) => false,
        }
    }

    pub async fn refresh(&self, range: TimeRange) -> DashboardSnapshot {
        self.refresh_at(range, Utc::now()).await
    }

    /// Refresh as if the current time were `now`.
    pub async fn refresh_at(&self, range: TimeRange, now: DateTime<Utc>) -> DashboardSnapshot {
        let (balance, transactions, price) = tokio::join!(
            self.wallet.fetch_balance(),
            self.wallet.fetch_transactions(),
            price_or_fallback(
                self.prices.as_ref(),
                DASHBOARD_CURRENCY,
                self.config.fallback_price
            ),
        );

        let mut errors = Vec::new();
        let mut cache = self.cache.write().await;

        let balance = match balance {
            Ok(balance) => {
                cache.balance = Some(balance.clone());
                balance
            }
            Err(e) => {
                warn!("Balance fetch failed: {}", e);
                errors.push(format!("Balance unavailable: {}", e));
                cache.balance.clone().unwrap_or_default()
            }
        };

        let transactions = match transactions {
            Ok(transactions) => {
                cache.transactions = Some(transactions.clone());
                transactions
            }
            Err(e) => {
                warn!("Transaction fetch failed: {}", e);
                errors.push(format!("Transactions unavailable: {}", e));
                cache.transactions.clone().unwrap_or_default()
            }
        };

        let price = if price.is_fallback() {
            errors.push(format!(
                "Price unavailable: {}",
                price.error.as_deref().unwrap_or("unknown error")
            ));
            cache.price.clone().unwrap_or(price)
        } else {
            cache.price = Some(price.clone());
            price
        };

        let snapshot = self.build_snapshot(range, now, &balance, &transactions, price, errors);
        cache.snapshot = Some(snapshot.clone());

        info!(
            "Dashboard refreshed: {} transactions, {} days, {} coffees",
            snapshot.transaction_count,
            snapshot.daily.len(),
            snapshot.coffee.smart_coffee_count
        );
        snapshot
    }

    fn build_snapshot(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
        balance: &WalletBalance,
        transactions: &[WalletTransaction],
        price: PriceQuote,
        errors: Vec<String>,
    ) -> DashboardSnapshot {
        let today = now.date_naive();
        let in_range = filter_by_range(transactions, &range, today);

        let daily = aggregate_daily_with(&in_range, price.price, &self.estimator);
        let stats = calculate_stats(&daily);
        let coffee = calculate_coffee_stats(&in_range, price.price, &self.estimator);
        let outgoing = outgoing_transactions(
            transactions,
            &range,
            today,
            self.config.earliest_date,
            price.price,
        );

        let balance_sats = balance.btc_sats();

        DashboardSnapshot {
            range,
            balance_sats,
            balance_btc: sats_to_btc(balance_sats as f64),
            balance_fiat: round2(sats_to_fiat(balance_sats as f64, price.price)),
            profit_loss: profit_loss(&stats, &coffee, self.config.coffee_margin),
            price,
            daily,
            stats,
            coffee,
            outgoing,
            transaction_count: in_range.len(),
            last_update: now,
            errors,
            mock: self.wallet.is_mock(),
        }
    }
}
