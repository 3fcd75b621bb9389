// 🧪 Mock Wallet - development data without a wallet token

use crate::error::Result;
use crate::transaction::{Direction, TxStatus, WalletTransaction};
use crate::wallet::{Wallet, WalletBalance, WalletSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const MOCK_BALANCE_SATS: i64 = 250_000;
const MOCK_DAYS: i64 = 7;

/// A week of plausible coffee payments ending at `now`.
///
/// Each day gets 2-8 settled incoming payments between 07:00 and 22:59 UTC,
/// worth 10k-110k sats each. The result is sorted by time.
pub fn generate_mock_transactions<R: Rng>(
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<WalletTransaction> {
    let mut transactions = Vec::new();

    for days_ago in (0..MOCK_DAYS).rev() {
        let day = now - Duration::days(days_ago);
        let per_day = rng.gen_range(2..=8);

        for n in 0..per_day {
            let hour = rng.gen_range(7..23);
            let minute = rng.gen_range(0..60);
            let created_at = day
                .with_hour(hour)
                .and_then(|t| t.with_minute(minute))
                .and_then(|t| t.with_second(0))
                .unwrap_or(day);

            transactions.push(
                WalletTransaction::new(
                    format!("mock_{}_{}_{}", now.timestamp(), days_ago, n),
                    Direction::Receive,
                    TxStatus::Success,
                    rng.gen_range(10_000..110_000),
                    created_at,
                )
                .with_settlement_currency("BTC")
                .with_memo(format!("Coffee Purchase #{}", n + 1)),
            );
        }
    }

    transactions.sort_by_key(|tx| tx.created_at);
    transactions
}

/// In-memory [`WalletSource`] backed by generated data.
pub struct MockWallet {
    transactions: Vec<WalletTransaction>,
    balance_sats: i64,
}

impl MockWallet {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::from_transactions(generate_mock_transactions(now, &mut rand::thread_rng()))
    }

    /// Reproducible data set.
    pub fn with_seed(now: DateTime<Utc>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::from_transactions(generate_mock_transactions(now, &mut rng))
    }

    pub fn from_transactions(transactions: Vec<WalletTransaction>) -> Self {
        MockWallet {
            transactions,
            balance_sats: MOCK_BALANCE_SATS,
        }
    }

    pub fn with_balance(mut self, balance_sats: i64) -> Self {
        self.balance_sats = balance_sats;
        self
    }
}

#[async_trait]
impl WalletSource for MockWallet {
    async fn fetch_balance(&self) -> Result<WalletBalance> {
        Ok(WalletBalance {
            wallets: vec![Wallet {
                id: "mock-btc-wallet".to_string(),
                currency: "BTC".to_string(),
                balance: self.balance_sats as f64,
            }],
        })
    }

    async fn fetch_transactions(&self) -> Result<Vec<WalletTransaction>> {
        Ok(self.transactions.clone())
    }

    fn is_mock(&self) -> bool {
        true
    }
}
