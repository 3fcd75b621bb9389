// 🔗 Wallet API Client - Blink GraphQL
//
// Two read-only queries: wallet balances and the transaction history.
// History is paged with a cursor; each page gets a bounded number of retries
// with a fixed backoff, and the walk stops after `max_pages` pages.

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::transaction::{deserialize_timestamp, Direction, TxStatus, WalletTransaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const BALANCE_QUERY: &str = r#"
  query {
    me {
      defaultAccount {
        wallets {
          id
          walletCurrency
          balance
        }
      }
    }
  }
"#;

const TRANSACTIONS_QUERY: &str = r#"
  query($first: Int!, $after: String) {
    me {
      defaultAccount {
        transactions(first: $first, after: $after) {
          pageInfo {
            hasNextPage
            endCursor
          }
          edges {
            node {
              id
              direction
              status
              settlementAmount
              settlementCurrency
              createdAt
              memo
            }
          }
        }
      }
    }
  }
"#;

// ============================================================================
// PUBLIC TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    #[serde(alias = "walletCurrency")]
    pub currency: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub wallets: Vec<Wallet>,
}

impl WalletBalance {
    /// Sum of all BTC wallets, in sats.
    pub fn btc_sats(&self) -> u64 {
        self.wallets
            .iter()
            .filter(|w| w.currency.eq_ignore_ascii_case("BTC"))
            .map(|w| w.balance.max(0.0).round() as u64)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub transactions: Vec<WalletTransaction>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Where balance and history come from. The HTTP client and the mock wallet both implement it.
#[async_trait]
pub trait WalletSource: Send + Sync {
    async fn fetch_balance(&self) -> Result<WalletBalance>;

    /// Full history, oldest page first as the API returns it.
    async fn fetch_transactions(&self) -> Result<Vec<WalletTransaction>>;

    fn is_mock(&self) -> bool {
        false
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct MeData<A> {
    me: Option<Me<A>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Me<A> {
    default_account: A,
}

#[derive(Deserialize)]
struct WalletsAccount {
    wallets: Vec<Wallet>,
}

#[derive(Deserialize)]
struct TransactionsAccount {
    transactions: Connection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    page_info: PageInfo,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Edge {
    node: TransactionNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionNode {
    id: String,
    direction: Direction,
    status: TxStatus,
    #[serde(default)]
    settlement_amount: Option<f64>,
    #[serde(default)]
    settlement_currency: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    memo: Option<String>,
}

impl From<TransactionNode> for WalletTransaction {
    fn from(node: TransactionNode) -> Self {
        WalletTransaction {
            id: node.id,
            direction: node.direction,
            status: node.status,
            amount_sats: node.settlement_amount.unwrap_or(0.0).round() as i64,
            created_at: node.created_at,
            settlement_currency: node.settlement_currency,
            memo: node.memo,
        }
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct BlinkClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    page_size: u32,
    max_pages: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl BlinkClient {
    /// Build a client from config. Fails when `BLINK_TOKEN` is missing.
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.require_token()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(BlinkClient {
            client,
            endpoint: config.blink_endpoint.clone(),
            token,
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Blink API returned {}: {}", status, body);
            return Err(DashboardError::Status {
                service: "Blink",
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| DashboardError::decode(format!("Blink response: {}", e)))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(DashboardError::api(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| DashboardError::api("Blink response has no data"))
    }

    pub async fn balance(&self) -> Result<WalletBalance> {
        let data: MeData<WalletsAccount> = self.query(BALANCE_QUERY, json!({})).await?;
        let me = data
            .me
            .ok_or_else(|| DashboardError::api("token is not bound to an account"))?;

        Ok(WalletBalance {
            wallets: me.default_account.wallets,
        })
    }

    /// One page of history starting after `after`.
    pub async fn transactions_page(&self, after: Option<&str>) -> Result<TransactionPage> {
        let variables = json!({ "first": self.page_size, "after": after });
        let data: MeData<TransactionsAccount> = self.query(TRANSACTIONS_QUERY, variables).await?;
        let me = data
            .me
            .ok_or_else(|| DashboardError::api("token is not bound to an account"))?;
        let connection = me.default_account.transactions;

        Ok(TransactionPage {
            transactions: connection.edges.into_iter().map(|e| e.node.into()).collect(),
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        })
    }

    async fn transactions_page_with_retry(&self, after: Option<&str>) -> Result<TransactionPage> {
        let mut attempt = 0;
        loop {
            match self.transactions_page(after).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Transaction page failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt, self.max_retries, e, self.retry_backoff
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Walk the whole history.
    ///
    /// A failure on the first page is returned as an error. A failure on a later
    /// page keeps what was already collected.
    pub async fn all_transactions(&self) -> Result<Vec<WalletTransaction>> {
        let mut transactions = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;

        for page_no in 0..self.max_pages {
            let page = match self.transactions_page_with_retry(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) if page_no == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        "Stopping pagination after {} pages ({} transactions): {}",
                        page_no,
                        transactions.len(),
                        e
                    );
                    break;
                }
            };

            debug!(
                "Page {}: {} transactions, has_next_page={}",
                page_no + 1,
                page.transactions.len(),
                page.has_next_page
            );

            for tx in page.transactions {
                if seen.insert(tx.id.clone()) {
                    transactions.push(tx);
                }
            }

            if !page.has_next_page {
                break;
            }
            match page.end_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    warn!("Blink reported another page but no cursor, stopping");
                    break;
                }
            }

            if page_no + 1 == self.max_pages {
                warn!("Reached page limit ({}), history may be incomplete", self.max_pages);
            }
        }

        info!("Fetched {} transactions from Blink", transactions.len());
        Ok(transactions)
    }
}

#[async_trait]
impl WalletSource for BlinkClient {
    async fn fetch_balance(&self) -> Result<WalletBalance> {
        self.balance().await
    }

    async fn fetch_transactions(&self) -> Result<Vec<WalletTransaction>> {
        self.all_transactions().await
    }
}
