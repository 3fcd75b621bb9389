// ⚡ Wallet Transactions
// Transient records pulled from the wallet API, plus the time ranges used to filter them.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// DIRECTION & STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Send,
    Receive,
}

/// Settlement status as reported by the wallet.
/// Anything the wallet adds later lands in `Other` instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TxStatus {
    Success,
    Pending,
    Failure,
    Other(String),
}

impl TxStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TxStatus::Success => "SUCCESS",
            TxStatus::Pending => "PENDING",
            TxStatus::Failure => "FAILURE",
            TxStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for TxStatus {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "SUCCESS" => TxStatus::Success,
            "PENDING" => TxStatus::Pending,
            "FAILURE" => TxStatus::Failure,
            _ => TxStatus::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TxStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TxStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TxStatus::from(raw.as_str()))
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: String,
    pub direction: Direction,
    pub status: TxStatus,

    /// Settlement amount in sats. Sends are usually negative; aggregation uses the magnitude.
    pub amount_sats: i64,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl WalletTransaction {
    pub fn new(
        id: impl Into<String>,
        direction: Direction,
        status: TxStatus,
        amount_sats: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        WalletTransaction {
            id: id.into(),
            direction,
            status,
            amount_sats,
            created_at,
            settlement_currency: None,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_settlement_currency(mut self, currency: impl Into<String>) -> Self {
        self.settlement_currency = Some(currency.into());
        self
    }

    pub fn is_successful(&self) -> bool {
        self.status == TxStatus::Success
    }

    /// Incoming payment that actually settled (the only kind that counts as revenue).
    pub fn is_successful_receive(&self) -> bool {
        self.direction == Direction::Receive && self.is_successful()
    }

    pub fn is_successful_send(&self) -> bool {
        self.direction == Direction::Send && self.is_successful()
    }

    pub fn sats(&self) -> u64 {
        self.amount_sats.unsigned_abs()
    }

    /// UTC calendar day the transaction belongs to.
    pub fn day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// The wallet reports `createdAt` as Unix seconds; older payloads and fixtures use RFC 3339.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(i64),
    Text(String),
}

fn parse_timestamp(raw: RawTimestamp) -> Result<DateTime<Utc>, String> {
    match raw {
        RawTimestamp::Seconds(secs) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {}", secs)),
        RawTimestamp::Text(text) => {
            if let Ok(secs) = text.parse::<i64>() {
                return parse_timestamp(RawTimestamp::Seconds(secs));
            }
            DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
        }
    }
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawTimestamp::deserialize(deserializer)?;
    parse_timestamp(raw).map_err(serde::de::Error::custom)
}

// ============================================================================
// TIME RANGE
// ============================================================================

/// Which slice of history the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TimeRange {
    AllTime,
    CurrentMonth,
    /// Inclusive on both ends.
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::AllTime
    }
}

impl TimeRange {
    /// Parse the `all-time` / `current-month` / `custom` selector used by the CLI and HTTP API.
    pub fn parse(kind: &str, start: Option<&str>, end: Option<&str>) -> Result<Self, String> {
        match kind.trim().to_lowercase().as_str() {
            "" | "all" | "all-time" => Ok(TimeRange::AllTime),
            "month" | "current-month" => Ok(TimeRange::CurrentMonth),
            "custom" => {
                let start = parse_day(start.ok_or("custom range needs a start date")?)?;
                let end = parse_day(end.ok_or("custom range needs an end date")?)?;
                if end < start {
                    return Err(format!("end date {} is before start date {}", end, start));
                }
                Ok(TimeRange::Custom { start, end })
            }
            other => Err(format!("unknown time range '{}'", other)),
        }
    }

    /// Inclusive day bounds relative to `today`, `None` meaning unbounded.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            TimeRange::AllTime => (None, None),
            TimeRange::CurrentMonth => (today.with_day(1), Some(today)),
            TimeRange::Custom { start, end } => (Some(*start), Some(*end)),
        }
    }

    pub fn contains(&self, day: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.bounds(today);
        start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
    }

    pub fn label(&self) -> String {
        match self {
            TimeRange::AllTime => "all time".to_string(),
            TimeRange::CurrentMonth => "current month".to_string(),
            TimeRange::Custom { start, end } => format!("{} - {}", start, end),
        }
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", raw, e))
}

/// Transactions whose UTC day falls inside `range`.
pub fn filter_by_range(
    transactions: &[WalletTransaction],
    range: &TimeRange,
    today: NaiveDate,
) -> Vec<WalletTransaction> {
    transactions
        .iter()
        .filter(|tx| range.contains(tx.day(), today))
        .cloned()
        .collect()
}
