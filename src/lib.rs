// PayMetrics - Core Library
// Lightning wallet dashboard for a coffee shop: balance, daily revenue, coffee estimates.
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod transaction;
pub mod convert;
pub mod aggregate;
pub mod coffee;
pub mod wallet;
pub mod price;
pub mod mock;
pub mod dashboard;
pub mod report;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{DashboardError, Result};
pub use config::Config;
pub use transaction::{filter_by_range, Direction, TimeRange, TxStatus, WalletTransaction};
pub use convert::{btc_to_fiat, format_currency, round2, sats_to_btc, sats_to_fiat, Currency};
pub use aggregate::{
    aggregate_daily, aggregate_daily_with, calculate_stats, outgoing_transactions,
    AggregatedStats, DailyData, OutgoingTx, Profit,
};
pub use coffee::{calculate_coffee_stats, profit_loss, CoffeeEstimator, CoffeeStats, PaymentClass};
pub use wallet::{BlinkClient, TransactionPage, Wallet, WalletBalance, WalletSource};
pub use price::{
    price_or_fallback, CoinGeckoClient, PriceOrigin, PriceQuote, PriceSource, PriceTable,
};
pub use mock::{generate_mock_transactions, MockWallet};
pub use dashboard::{DashboardService, DashboardSnapshot};
pub use report::{export_daily_csv, render_report, write_daily_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
