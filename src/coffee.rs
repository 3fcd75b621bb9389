// ☕ Coffee Estimation - infer unit sales from payment amounts
//
// The wallet only knows amounts, not line items. Each settled incoming payment
// is classified by its fiat value against the coffee price:
//
//   value < dust_threshold                 → Dust   (test pings, rounding)
//   value / price < min_ratio              → Tip    (too small for a coffee)
//   min_ratio ≤ value / price ≤ single_max → 1 coffee
//   value / price > single_max             → round(value / price), capped
//   value > bulk_threshold                 → Bulk   (top-ups, transfers)

use crate::aggregate::AggregatedStats;
use crate::convert::{round2, sats_to_fiat};
use crate::transaction::WalletTransaction;
use serde::{Deserialize, Serialize};

// ============================================================================
// PAYMENT CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "coffees", rename_all = "lowercase")]
pub enum PaymentClass {
    Dust,
    Tip,
    Coffee(u32),
    Bulk,
}

impl PaymentClass {
    pub fn coffees(&self) -> u32 {
        match self {
            PaymentClass::Coffee(n) => *n,
            _ => 0,
        }
    }

    pub fn is_coffee(&self) -> bool {
        matches!(self, PaymentClass::Coffee(_))
    }
}

// ============================================================================
// ESTIMATOR
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoffeeEstimator {
    /// Price of one coffee in fiat (default: 2.50)
    pub coffee_price: f64,

    /// Payments below this fiat value are ignored (default: 0.10)
    pub dust_threshold: f64,

    /// Minimum value/price ratio for a payment to count as a coffee (default: 0.5)
    pub min_ratio: f64,

    /// Up to this ratio a payment is a single coffee (default: 1.5)
    pub single_max_ratio: f64,

    /// Cap for multi-coffee payments (default: 20)
    pub max_per_payment: u32,

    /// Payments above this fiat value are not coffee sales (default: 50.00)
    pub bulk_threshold: f64,
}

impl Default for CoffeeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoffeeEstimator {
    pub fn new() -> Self {
        CoffeeEstimator {
            coffee_price: 2.50,
            dust_threshold: 0.10,
            min_ratio: 0.5,
            single_max_ratio: 1.5,
            max_per_payment: 20,
            bulk_threshold: 50.0,
        }
    }

    pub fn with_price(coffee_price: f64) -> Self {
        CoffeeEstimator {
            coffee_price,
            ..Self::new()
        }
    }

    pub fn with_thresholds(coffee_price: f64, dust_threshold: f64, bulk_threshold: f64) -> Self {
        CoffeeEstimator {
            coffee_price,
            dust_threshold,
            bulk_threshold,
            ..Self::new()
        }
    }

    /// Classify a payment by its fiat value.
    pub fn classify_value(&self, value: f64) -> PaymentClass {
        if self.coffee_price <= 0.0 || !value.is_finite() || value < self.dust_threshold {
            return PaymentClass::Dust;
        }
        if value > self.bulk_threshold {
            return PaymentClass::Bulk;
        }

        let ratio = value / self.coffee_price;
        if ratio < self.min_ratio {
            PaymentClass::Tip
        } else if ratio <= self.single_max_ratio {
            PaymentClass::Coffee(1)
        } else {
            let count = ratio.round().min(self.max_per_payment as f64) as u32;
            PaymentClass::Coffee(count.max(1))
        }
    }

    /// Classify a transaction at the given BTC price.
    ///
    /// Only settled incoming payments can be coffees. The fiat value is rounded to
    /// cents first so thresholds compare against the amount the customer paid.
    pub fn classify(&self, tx: &WalletTransaction, btc_price: f64) -> PaymentClass {
        if !tx.is_successful_receive() || btc_price <= 0.0 {
            return PaymentClass::Dust;
        }
        self.classify_value(round2(sats_to_fiat(tx.sats() as f64, btc_price)))
    }

    pub fn count_coffees<'a, I>(&self, transactions: I, btc_price: f64) -> u32
    where
        I: IntoIterator<Item = &'a WalletTransaction>,
    {
        transactions
            .into_iter()
            .map(|tx| self.classify(tx, btc_price).coffees())
            .sum()
    }
}

// ============================================================================
// COFFEE STATS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoffeeStats {
    pub coffee_price: f64,
    /// Sum of per-payment estimates
    pub smart_coffee_count: u32,
    /// floor(total_received / coffee_price)
    pub simple_coffee_count: u32,
    pub average_price_per_coffee: f64,
    pub total_received: f64,
    pub receive_count: usize,
    pub total_sent: f64,
    pub send_count: usize,
    /// Dust and tips
    pub ignored_count: usize,
    pub bulk_count: usize,
}

/// Coffee sales and money flow over the given transactions.
pub fn calculate_coffee_stats(
    transactions: &[WalletTransaction],
    btc_price: f64,
    estimator: &CoffeeEstimator,
) -> CoffeeStats {
    let mut stats = CoffeeStats {
        coffee_price: estimator.coffee_price,
        ..CoffeeStats::default()
    };

    if btc_price <= 0.0 || estimator.coffee_price <= 0.0 {
        return stats;
    }

    let mut received = 0.0;
    let mut sent = 0.0;
    let mut coffee_revenue = 0.0;

    for tx in transactions {
        let value = sats_to_fiat(tx.sats() as f64, btc_price);

        if tx.is_successful_receive() {
            received += value;
            stats.receive_count += 1;

            match estimator.classify_value(round2(value)) {
                PaymentClass::Coffee(n) => {
                    stats.smart_coffee_count += n;
                    coffee_revenue += value;
                }
                PaymentClass::Bulk => stats.bulk_count += 1,
                PaymentClass::Dust | PaymentClass::Tip => stats.ignored_count += 1,
            }
        } else if tx.is_successful_send() {
            sent += value;
            stats.send_count += 1;
        }
    }

    stats.total_received = round2(received);
    stats.total_sent = round2(sent);

    stats.simple_coffee_count = (stats.total_received / estimator.coffee_price).floor() as u32;

    if stats.smart_coffee_count > 0 {
        stats.average_price_per_coffee = round2(coffee_revenue / stats.smart_coffee_count as f64);
    }

    stats
}

/// Margin earned on coffees minus net wallet inflow: `coffees × margin − (income − expenses)`.
pub fn profit_loss(stats: &AggregatedStats, coffee: &CoffeeStats, margin_per_coffee: f64) -> f64 {
    round2(stats.total_coffees as f64 * margin_per_coffee - (stats.total_euros - coffee.total_sent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Direction, TxStatus};
    use chrono::{TimeZone, Utc};

    // 1 sat = 0.001 at this price, so 2_500 sats is one 2.50 coffee
    const PRICE: f64 = 100_000.0;

    fn tx(id: &str, direction: Direction, status: TxStatus, sats: i64) -> WalletTransaction {
        let at = Utc.with_ymd_and_hms(2025, 9, 10, 9, 30, 0).unwrap();
        WalletTransaction::new(id, direction, status, sats, at)
    }

    fn received(id: &str, sats: i64) -> WalletTransaction {
        tx(id, Direction::Receive, TxStatus::Success, sats)
    }

    #[test]
    fn test_classify_value_thresholds() {
        let estimator = CoffeeEstimator::new();

        assert_eq!(estimator.classify_value(0.05), PaymentClass::Dust);
        assert_eq!(estimator.classify_value(1.00), PaymentClass::Tip);
        assert_eq!(estimator.classify_value(1.30), PaymentClass::Coffee(1));
        assert_eq!(estimator.classify_value(2.50), PaymentClass::Coffee(1));
        assert_eq!(estimator.classify_value(3.70), PaymentClass::Coffee(1));
        assert_eq!(estimator.classify_value(5.00), PaymentClass::Coffee(2));
        assert_eq!(estimator.classify_value(8.90), PaymentClass::Coffee(4));
        assert_eq!(estimator.classify_value(75.00), PaymentClass::Bulk);
    }

    #[test]
    fn test_multi_coffee_payment_is_capped() {
        let estimator = CoffeeEstimator::with_thresholds(1.0, 0.10, 1_000.0);

        assert_eq!(estimator.classify_value(500.0), PaymentClass::Coffee(20));
    }

    #[test]
    fn test_non_positive_coffee_price_counts_nothing() {
        let estimator = CoffeeEstimator::with_price(0.0);

        assert_eq!(estimator.classify_value(2.50), PaymentClass::Dust);
        let stats = calculate_coffee_stats(&[received("a", 2_500)], PRICE, &estimator);
        assert_eq!(stats.smart_coffee_count, 0);
        assert_eq!(stats.simple_coffee_count, 0);
        assert_eq!(stats.receive_count, 0);
        assert_eq!(stats.ignored_count, 0);
        assert_eq!(stats.bulk_count, 0);
        assert_eq!(stats.coffee_price, 0.0);
    }

    #[test]
    fn test_classify_at_exact_boundaries() {
        let estimator = CoffeeEstimator::new();

        // 100 sats = 0.10, 1_250 = 1.25 (ratio 0.5), 3_750 = 3.75 (ratio 1.5), 50_000 = 50.00
        assert_eq!(estimator.classify(&received("dust-edge", 100), PRICE), PaymentClass::Tip);
        assert_eq!(estimator.classify(&received("low", 1_250), PRICE), PaymentClass::Coffee(1));
        assert_eq!(estimator.classify(&received("high", 3_750), PRICE), PaymentClass::Coffee(1));
        assert_eq!(estimator.classify(&received("bulk", 50_000), PRICE), PaymentClass::Coffee(20));
        assert_eq!(estimator.classify(&received("below", 90), PRICE), PaymentClass::Dust);
    }

    #[test]
    fn test_classification_does_not_depend_on_float_noise() {
        let estimator = CoffeeEstimator::new();

        // 167 sats at 60 000 is 0.1002, still 0.10 after rounding
        assert_eq!(estimator.classify(&received("a", 167), 60_000.0), PaymentClass::Tip);

        let edges = vec![received("a", 100), received("b", 1_250), received("c", 3_750)];
        let stats = calculate_coffee_stats(&edges, PRICE, &estimator);
        assert_eq!(stats.smart_coffee_count, 2);
        assert_eq!(stats.ignored_count, 1);
        assert_eq!(stats.bulk_count, 0);
    }

    #[test]
    fn test_only_settled_receives_are_coffees() {
        let estimator = CoffeeEstimator::new();

        assert_eq!(
            estimator.classify(&received("a", 2_500), PRICE),
            PaymentClass::Coffee(1)
        );
        assert_eq!(
            estimator.classify(&tx("b", Direction::Receive, TxStatus::Pending, 2_500), PRICE),
            PaymentClass::Dust
        );
        assert_eq!(
            estimator.classify(&tx("c", Direction::Send, TxStatus::Success, -2_500), PRICE),
            PaymentClass::Dust
        );
    }

    #[test]
    fn test_calculate_coffee_stats() {
        let estimator = CoffeeEstimator::new();
        let transactions = vec![
            received("one", 2_500),    // 2.50 → 1
            received("two", 5_000),    // 5.00 → 2
            received("tip", 500),      // 0.50 → tip
            received("dust", 20),      // 0.02 → dust
            received("topup", 80_000), // 80.00 → bulk
            tx("fail", Direction::Receive, TxStatus::Failure, 2_500),
            tx("out", Direction::Send, TxStatus::Success, -10_000),
            tx("out-pending", Direction::Send, TxStatus::Pending, -10_000),
        ];

        let stats = calculate_coffee_stats(&transactions, PRICE, &estimator);

        assert_eq!(stats.smart_coffee_count, 3);
        assert_eq!(stats.receive_count, 5);
        assert_eq!(stats.ignored_count, 2);
        assert_eq!(stats.bulk_count, 1);
        assert_eq!(stats.total_received, 88.02);
        assert_eq!(stats.simple_coffee_count, 35);
        assert_eq!(stats.average_price_per_coffee, 2.5);
        assert_eq!(stats.send_count, 1);
        assert_eq!(stats.total_sent, 10.0);
    }

    #[test]
    fn test_zero_price_yields_empty_stats() {
        let estimator = CoffeeEstimator::new();
        let stats = calculate_coffee_stats(&[received("a", 2_500)], 0.0, &estimator);

        assert_eq!(stats.receive_count, 0);
        assert_eq!(stats.smart_coffee_count, 0);
        assert_eq!(stats.coffee_price, 2.50);
    }

    #[test]
    fn test_profit_loss() {
        let stats = AggregatedStats {
            total_euros: 100.0,
            total_sats: 100_000,
            total_transactions: 40,
            total_coffees: 40,
            average_transaction_value: 2.5,
            daily_average: 50.0,
        };
        let coffee = CoffeeStats {
            total_sent: 95.0,
            ..CoffeeStats::default()
        };

        // 40 × 0.30 − (100 − 95) = 12 − 5
        assert_eq!(profit_loss(&stats, &coffee, 0.30), 7.0);
    }
}
