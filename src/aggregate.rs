// 📊 Daily Aggregation
// Buckets settled incoming payments per UTC day and rolls them up into summary stats.

use crate::coffee::CoffeeEstimator;
use crate::convert::{round2, sats_to_fiat};
use crate::transaction::{TimeRange, WalletTransaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profit {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyData {
    /// `YYYY-MM-DD` in UTC
    pub date: String,
    pub euros: f64,
    pub sats: u64,
    pub transaction_count: usize,
    pub coffee_count: u32,
    pub profit: Profit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub total_euros: f64,
    pub total_sats: u64,
    pub total_transactions: usize,
    pub total_coffees: u32,
    pub average_transaction_value: f64,
    pub daily_average: f64,
}

/// A single settled outgoing payment, valued in fiat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingTx {
    pub date: String,
    pub amount: f64,
    pub currency: String,
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Daily revenue from settled incoming payments, oldest day first.
pub fn aggregate_daily(transactions: &[WalletTransaction], eur_price: f64) -> Vec<DailyData> {
    aggregate_daily_with(transactions, eur_price, &CoffeeEstimator::default())
}

/// Same as [`aggregate_daily`] with a custom coffee estimator for the per-day counts.
pub fn aggregate_daily_with(
    transactions: &[WalletTransaction],
    eur_price: f64,
    estimator: &CoffeeEstimator,
) -> Vec<DailyData> {
    // BTreeMap keeps days sorted
    let mut by_day: BTreeMap<NaiveDate, Vec<&WalletTransaction>> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_successful_receive()) {
        by_day.entry(tx.day()).or_default().push(tx);
    }

    by_day
        .into_iter()
        .map(|(day, txs)| {
            let sats: u64 = txs.iter().map(|tx| tx.sats()).sum();
            let euros = round2(sats_to_fiat(sats as f64, eur_price));

            DailyData {
                date: day.format("%Y-%m-%d").to_string(),
                euros,
                sats,
                transaction_count: txs.len(),
                coffee_count: estimator.count_coffees(txs.iter().copied(), eur_price),
                profit: if euros > 0.0 { Profit::Positive } else { Profit::Neutral },
            }
        })
        .collect()
}

/// Totals and averages over the daily buckets.
pub fn calculate_stats(daily: &[DailyData]) -> AggregatedStats {
    let total_euros: f64 = daily.iter().map(|d| d.euros).sum();
    let total_sats: u64 = daily.iter().map(|d| d.sats).sum();
    let total_transactions: usize = daily.iter().map(|d| d.transaction_count).sum();
    let total_coffees: u32 = daily.iter().map(|d| d.coffee_count).sum();

    AggregatedStats {
        total_euros: round2(total_euros),
        total_sats,
        total_transactions,
        total_coffees,
        average_transaction_value: if total_transactions > 0 {
            round2(total_euros / total_transactions as f64)
        } else {
            0.0
        },
        daily_average: if !daily.is_empty() {
            round2(total_euros / daily.len() as f64)
        } else {
            0.0
        },
    }
}

/// Settled outgoing payments inside `range`, never earlier than `earliest`.
///
/// Amounts are not rounded; display code rounds to cents.
pub fn outgoing_transactions(
    transactions: &[WalletTransaction],
    range: &TimeRange,
    today: NaiveDate,
    earliest: NaiveDate,
    eur_price: f64,
) -> Vec<OutgoingTx> {
    let (start, end) = range.bounds(today);
    let start = start.map_or(earliest, |s| s.max(earliest));

    transactions
        .iter()
        .filter(|tx| tx.is_successful_send())
        .filter(|tx| {
            let day = tx.day();
            day >= start && end.map_or(true, |e| day <= e)
        })
        .map(|tx| OutgoingTx {
            date: tx.day().format("%Y-%m-%d").to_string(),
            amount: sats_to_fiat(tx.sats() as f64, eur_price.max(0.0)),
            currency: "EUR".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Direction, TxStatus};
    use chrono::{TimeZone, Utc};

    const PRICE: f64 = 100_000.0;

    fn create_test_transaction(
        id: &str,
        direction: Direction,
        status: TxStatus,
        sats: i64,
        day: u32,
        hour: u32,
    ) -> WalletTransaction {
        let at = Utc.with_ymd_and_hms(2025, 9, day, hour, 15, 0).unwrap();
        WalletTransaction::new(id, direction, status, sats, at)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aggregate_daily_groups_and_sorts() {
        let transactions = vec![
            create_test_transaction("c", Direction::Receive, TxStatus::Success, 5_000, 11, 8),
            create_test_transaction("a", Direction::Receive, TxStatus::Success, 2_500, 10, 23),
            create_test_transaction("b", Direction::Receive, TxStatus::Success, 2_500, 10, 7),
            create_test_transaction("d", Direction::Receive, TxStatus::Pending, 9_000, 10, 9),
            create_test_transaction("e", Direction::Send, TxStatus::Success, -9_000, 11, 9),
        ];

        let daily = aggregate_daily(&transactions, PRICE);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2025-09-10");
        assert_eq!(daily[0].sats, 5_000);
        assert_eq!(daily[0].euros, 5.0);
        assert_eq!(daily[0].transaction_count, 2);
        assert_eq!(daily[0].coffee_count, 2);
        assert_eq!(daily[0].profit, Profit::Positive);

        assert_eq!(daily[1].date, "2025-09-11");
        assert_eq!(daily[1].transaction_count, 1);
        assert_eq!(daily[1].coffee_count, 2);
    }

    #[test]
    fn test_aggregate_daily_uses_absolute_amounts() {
        let transactions = vec![create_test_transaction(
            "neg",
            Direction::Receive,
            TxStatus::Success,
            -2_500,
            12,
            10,
        )];

        let daily = aggregate_daily(&transactions, PRICE);

        assert_eq!(daily[0].sats, 2_500);
        assert_eq!(daily[0].euros, 2.5);
    }

    #[test]
    fn test_zero_price_marks_days_neutral() {
        let transactions = vec![create_test_transaction(
            "a",
            Direction::Receive,
            TxStatus::Success,
            2_500,
            12,
            10,
        )];

        let daily = aggregate_daily(&transactions, 0.0);

        assert_eq!(daily[0].euros, 0.0);
        assert_eq!(daily[0].profit, Profit::Neutral);
        assert_eq!(daily[0].coffee_count, 0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_daily(&[], PRICE).is_empty());

        let stats = calculate_stats(&[]);
        assert_eq!(stats, AggregatedStats::default());
    }

    #[test]
    fn test_calculate_stats() {
        let daily = vec![
            DailyData {
                date: "2025-09-10".to_string(),
                euros: 12.50,
                sats: 12_500,
                transaction_count: 3,
                coffee_count: 5,
                profit: Profit::Positive,
            },
            DailyData {
                date: "2025-09-11".to_string(),
                euros: 8.75,
                sats: 8_750,
                transaction_count: 2,
                coffee_count: 3,
                profit: Profit::Positive,
            },
        ];

        let stats = calculate_stats(&daily);

        assert_eq!(stats.total_euros, 21.25);
        assert_eq!(stats.total_sats, 21_250);
        assert_eq!(stats.total_transactions, 5);
        assert_eq!(stats.total_coffees, 8);
        assert_eq!(stats.average_transaction_value, 4.25);
        assert_eq!(stats.daily_average, 10.63);
    }

    #[test]
    fn test_outgoing_transactions_clamped_to_earliest_date() {
        let sent = |id: &str, status: TxStatus, sats: i64, m: u32, d: u32| {
            let at = Utc.with_ymd_and_hms(2025, m, d, 12, 0, 0).unwrap();
            WalletTransaction::new(id, Direction::Send, status, sats, at)
        };
        let transactions = vec![
            sent("old", TxStatus::Success, -1_000, 2, 10),
            sent("in", TxStatus::Success, -2_000, 2, 11),
            sent("late", TxStatus::Success, -3_000, 9, 14),
            sent("failed", TxStatus::Failure, -4_000, 3, 1),
            create_test_transaction("recv", Direction::Receive, TxStatus::Success, 5_000, 1, 12),
        ];
        let range = TimeRange::Custom {
            start: date(2025, 1, 1),
            end: date(2025, 9, 13),
        };

        let outgoing = outgoing_transactions(
            &transactions,
            &range,
            date(2025, 9, 20),
            date(2025, 2, 11),
            PRICE,
        );

        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].date, "2025-02-11");
        assert!((outgoing[0].amount - 2.0).abs() < 1e-9);
        assert_eq!(outgoing[0].currency, "EUR");
    }

    #[test]
    fn test_outgoing_amount_is_not_rounded() {
        let transactions = vec![create_test_transaction(
            "x",
            Direction::Send,
            TxStatus::Success,
            -1_234,
            5,
            12,
        )];

        // 1_234 sats at 52 000 is 0.64168
        let outgoing = outgoing_transactions(
            &transactions,
            &TimeRange::AllTime,
            date(2025, 9, 6),
            date(2025, 2, 11),
            52_000.0,
        );

        assert!((outgoing[0].amount - 0.64168).abs() < 1e-9);
    }

    #[test]
    fn test_outgoing_all_time_is_open_ended() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let transactions = vec![WalletTransaction::new(
            "x",
            Direction::Send,
            TxStatus::Success,
            -1_000,
            at,
        )];

        let outgoing = outgoing_transactions(
            &transactions,
            &TimeRange::AllTime,
            date(2026, 1, 6),
            date(2025, 2, 11),
            PRICE,
        );

        assert_eq!(outgoing.len(), 1);
    }
}
